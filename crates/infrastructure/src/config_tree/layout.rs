use std::path::{Path, PathBuf};
use warden_domain::VlanId;

/// Include directory for generated blocklist fragments.
pub const BLACKLISTS_DIR: &str = "blacklists.d";
/// Include directory for local-data fragments (mesh hosts, custom records).
pub const LOCAL_DIR: &str = "local.d";
/// Generated mesh-VPN hosts fragment inside [`LOCAL_DIR`].
pub const MESH_HOSTS_FILE: &str = "tailscale-hosts.conf";

pub fn blacklists_dir(vlan_dir: &Path) -> PathBuf {
    vlan_dir.join(BLACKLISTS_DIR)
}

pub fn local_dir(vlan_dir: &Path) -> PathBuf {
    vlan_dir.join(LOCAL_DIR)
}

pub fn mesh_hosts_file(vlan_dir: &Path) -> PathBuf {
    local_dir(vlan_dir).join(MESH_HOSTS_FILE)
}

/// Enumerate existing VLAN config directories under the base directory:
/// `default` plus every purely numeric entry.
pub fn discover_vlan_dirs(base_dir: &Path) -> Vec<(VlanId, PathBuf)> {
    let mut dirs = Vec::new();

    let default_dir = base_dir.join("default");
    if default_dir.is_dir() {
        dirs.push((VlanId::DEFAULT, default_dir));
    }

    if let Ok(entries) = std::fs::read_dir(base_dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            if let Some(id) = entry
                .file_name()
                .to_str()
                .and_then(|n| n.parse::<u32>().ok())
            {
                if id > 0 {
                    dirs.push((VlanId(id), path));
                }
            }
        }
    }

    dirs.sort_by_key(|(vlan, _)| vlan.0);
    dirs
}
