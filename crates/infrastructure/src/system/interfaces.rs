use std::net::Ipv4Addr;

/// First IPv4 address of the named interface, from the kernel's
/// interface listing.
pub fn interface_ipv4(name: &str) -> Option<Ipv4Addr> {
    let addrs = nix::ifaddrs::getifaddrs().ok()?;
    for entry in addrs {
        if entry.interface_name != name {
            continue;
        }
        if let Some(address) = entry.address {
            if let Some(sin) = address.as_sockaddr_in() {
                return Some(Ipv4Addr::from(sin.ip()));
            }
        }
    }
    None
}
