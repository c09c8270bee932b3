use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BlocklistConfig {
    /// Per-request timeout for blocklist downloads. A timed-out source is
    /// skipped; its existing include file stays in place.
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,

    /// Seconds between periodic full refreshes in the `run` command.
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,

    #[serde(default = "default_true")]
    pub refresh_enabled: bool,
}

impl Default for BlocklistConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_secs: default_fetch_timeout_secs(),
            refresh_interval_secs: default_refresh_interval_secs(),
            refresh_enabled: true,
        }
    }
}

fn default_fetch_timeout_secs() -> u64 {
    30
}

fn default_refresh_interval_secs() -> u64 {
    86400
}

fn default_true() -> bool {
    true
}
