use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Filesystem layout of the per-VLAN config trees and their inputs.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PathsConfig {
    /// Parent of every VLAN config directory (`<base>/default`, `<base>/10`, …).
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,

    /// Template tree copied into a fresh VLAN directory.
    #[serde(default = "default_template_dir")]
    pub template_dir: PathBuf,

    /// JSON enumeration of the host's VLANs.
    #[serde(default = "default_vlans_file")]
    pub vlans_file: PathBuf,

    /// `KEY="value"` network configuration (interface names).
    #[serde(default = "default_network_config")]
    pub network_config: PathBuf,
}

impl PathsConfig {
    /// Config directory of one VLAN.
    pub fn vlan_dir(&self, vlan: crate::VlanId) -> PathBuf {
        self.base_dir.join(vlan.dir_name())
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
            template_dir: default_template_dir(),
            vlans_file: default_vlans_file(),
            network_config: default_network_config(),
        }
    }
}

fn default_base_dir() -> PathBuf {
    PathBuf::from("/etc/unbound-warden/instances")
}

fn default_template_dir() -> PathBuf {
    PathBuf::from("/usr/share/unbound-warden/template")
}

fn default_vlans_file() -> PathBuf {
    PathBuf::from("/etc/unbound-warden/vlans.json")
}

fn default_network_config() -> PathBuf {
    PathBuf::from("/etc/unbound-warden/network.cfg")
}
