use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable overriding the database name.
pub const DB_NAME_ENV: &str = "UNBOUND_DB_NAME";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Logical database name; becomes `<data_dir>/<name>.db`.
    /// Overridden at runtime by `UNBOUND_DB_NAME`.
    #[serde(default = "default_db_name")]
    pub name: String,

    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Maximum connections in the write pool. SQLite WAL serialises
    /// writers at the file level, so more connections only add contention.
    /// Default: 3.
    #[serde(default = "default_write_pool_max_connections")]
    pub write_pool_max_connections: u32,

    /// Seconds a writer waits for a database lock before `SQLITE_BUSY`.
    /// Default: 30.
    #[serde(default = "default_write_busy_timeout_secs")]
    pub write_busy_timeout_secs: u64,
}

impl DatabaseConfig {
    /// Database name after applying the `UNBOUND_DB_NAME` override.
    pub fn resolved_name(&self) -> String {
        std::env::var(DB_NAME_ENV).unwrap_or_else(|_| self.name.clone())
    }

    /// On-disk path of the database file.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(format!("{}.db", self.resolved_name()))
    }

    /// sqlx connection URL for the database file.
    pub fn database_url(&self) -> String {
        format!("sqlite://{}", self.database_path().display())
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            name: default_db_name(),
            data_dir: default_data_dir(),
            write_pool_max_connections: default_write_pool_max_connections(),
            write_busy_timeout_secs: default_write_busy_timeout_secs(),
        }
    }
}

fn default_db_name() -> String {
    "unbound".to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("/var/lib/unbound-warden")
}

fn default_write_pool_max_connections() -> u32 {
    3
}

fn default_write_busy_timeout_secs() -> u64 {
    30
}
