use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HostsConfig {
    /// Domain suffix appended to every mesh-VPN hostname.
    #[serde(default = "default_domain_suffix")]
    pub domain_suffix: String,

    /// Seconds between periodic hosts syncs in the `run` command.
    #[serde(default = "default_sync_interval_secs")]
    pub sync_interval_secs: u64,

    #[serde(default = "default_true")]
    pub sync_enabled: bool,
}

impl Default for HostsConfig {
    fn default() -> Self {
        Self {
            domain_suffix: default_domain_suffix(),
            sync_interval_secs: default_sync_interval_secs(),
            sync_enabled: true,
        }
    }
}

fn default_domain_suffix() -> String {
    "mesh.internal".to_string()
}

fn default_sync_interval_secs() -> u64 {
    300
}

fn default_true() -> bool {
    true
}
