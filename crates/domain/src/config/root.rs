use super::{
    BlocklistConfig, ConfigError, DatabaseConfig, HostsConfig, LoggingConfig, PathsConfig,
    ResolverConfig,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_CONFIG_PATH: &str = "/etc/unbound-warden/config.toml";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub resolver: ResolverConfig,
    #[serde(default)]
    pub hosts: HostsConfig,
    #[serde(default)]
    pub blocklists: BlocklistConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// An explicitly given path must exist; the default path falls back to
    /// built-in defaults when absent so a bare install still runs.
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let (path, required) = match path {
            Some(p) => (p, true),
            None => (DEFAULT_CONFIG_PATH, false),
        };

        if !Path::new(path).exists() {
            if required {
                return Err(ConfigError::Read {
                    path: path.to_string(),
                    message: "file not found".to_string(),
                });
            }
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_string(),
            message: e.to_string(),
        })?;

        toml::from_str(&text).map_err(|e| ConfigError::Parse {
            path: path.to_string(),
            message: e.to_string(),
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.resolver.user.is_empty() {
            return Err(ConfigError::Invalid {
                key: "resolver.user".to_string(),
                message: "service account name cannot be empty".to_string(),
            });
        }
        if self.resolver.spawn_grace_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "resolver.spawn_grace_secs".to_string(),
                message: "must be at least 1 second".to_string(),
            });
        }
        if self.hosts.domain_suffix.is_empty() || self.hosts.domain_suffix.ends_with('.') {
            return Err(ConfigError::Invalid {
                key: "hosts.domain_suffix".to_string(),
                message: "must be non-empty without a trailing dot".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let cfg: Config = toml::from_str(
            r#"
            [hosts]
            domain_suffix = "example.net"

            [database]
            name = "dnslog"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.hosts.domain_suffix, "example.net");
        assert_eq!(cfg.database.name, "dnslog");
        assert_eq!(cfg.resolver.user, "unbound");
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn test_trailing_dot_suffix_rejected() {
        let mut cfg = Config::default();
        cfg.hosts.domain_suffix = "example.net.".to_string();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_explicit_missing_path_is_error() {
        assert!(Config::load(Some("/nonexistent/warden.toml")).is_err());
    }
}
