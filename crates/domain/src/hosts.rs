/// One host from the mesh-VPN status snapshot.
///
/// Addresses are kept as strings; invalid entries are skipped (with a
/// warning) at render time rather than rejected here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostRecord {
    pub hostname: String,
    pub ips: Vec<String>,
}
