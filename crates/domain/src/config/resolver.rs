use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResolverConfig {
    /// Resolver executable, spawned once per VLAN.
    #[serde(default = "default_binary")]
    pub binary: PathBuf,

    /// Service account that owns every VLAN config tree and runs the
    /// resolver.
    #[serde(default = "default_user")]
    pub user: String,

    /// Canonical config base the template references; rewritten to the
    /// per-VLAN directory during materialisation.
    #[serde(default = "default_canonical_base")]
    pub canonical_base: String,

    /// Seconds to wait for a freshly spawned resolver to become
    /// observable before the slot is marked failed. Default: 5.
    #[serde(default = "default_spawn_grace_secs")]
    pub spawn_grace_secs: u64,

    /// Seconds between the soft termination signal and SIGKILL during
    /// shutdown. Default: 2.
    #[serde(default = "default_shutdown_grace_secs")]
    pub shutdown_grace_secs: u64,
}

impl ResolverConfig {
    pub const CONF_FILE_NAME: &'static str = "unbound.conf";

    /// Arguments for the debug-mode invocation whose output the ingestor
    /// parses: foreground, no self-written pidfile, maximum verbosity.
    pub fn spawn_args(&self, config_file: &std::path::Path) -> Vec<String> {
        vec![
            "-d".to_string(),
            "-p".to_string(),
            "-vvvv".to_string(),
            "-c".to_string(),
            config_file.display().to_string(),
        ]
    }

    /// Command-line substring identifying stray resolver processes during
    /// teardown fallback.
    pub fn process_pattern(&self) -> String {
        format!("{} -d", self.binary.display())
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            binary: default_binary(),
            user: default_user(),
            canonical_base: default_canonical_base(),
            spawn_grace_secs: default_spawn_grace_secs(),
            shutdown_grace_secs: default_shutdown_grace_secs(),
        }
    }
}

fn default_binary() -> PathBuf {
    PathBuf::from("/usr/sbin/unbound")
}

fn default_user() -> String {
    "unbound".to_string()
}

fn default_canonical_base() -> String {
    "/etc/unbound".to_string()
}

fn default_spawn_grace_secs() -> u64 {
    5
}

fn default_shutdown_grace_secs() -> u64 {
    2
}
