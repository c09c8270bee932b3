use crate::system::interfaces;
use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::path::Path;
use tracing::warn;
use warden_domain::{ConfigError, VlanId};

pub const PRIMARY_INTERFACE_KEY: &str = "PRIMARY_INTERFACE";
pub const SECONDARY_INTERFACE_KEY: &str = "SECONDARY_INTERFACE";
pub const INTERNAL_INTERFACE_KEY: &str = "INTERNAL_INTERFACE";

/// Host network configuration, read from a `KEY="value"` file.
///
/// VLAN v binds the tagged interface `<internal>.<v>`; the default
/// instance binds the internal interface itself.
#[derive(Debug, Clone, Default)]
pub struct NetConfig {
    values: HashMap<String, String>,
}

impl NetConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::Network(format!("cannot read {}: {}", path.display(), e))
        })?;
        Ok(Self::parse(&text))
    }

    pub fn parse(text: &str) -> Self {
        let mut values = HashMap::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let value = value.trim().trim_matches('"').trim_matches('\'');
            values.insert(key.trim().to_string(), value.to_string());
        }
        Self { values }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn primary_interface(&self) -> Option<&str> {
        self.get(PRIMARY_INTERFACE_KEY)
    }

    pub fn secondary_interface(&self) -> Option<&str> {
        self.get(SECONDARY_INTERFACE_KEY)
    }

    pub fn internal_interface(&self) -> Result<&str, ConfigError> {
        self.get(INTERNAL_INTERFACE_KEY)
            .ok_or_else(|| ConfigError::MissingKey(INTERNAL_INTERFACE_KEY.to_string()))
    }

    /// Interface name a VLAN's resolver binds to.
    pub fn vlan_interface(&self, vlan: VlanId) -> Result<String, ConfigError> {
        Ok(vlan.interface_name(self.internal_interface()?))
    }

    /// IPv4 bind address for a VLAN, if the tagged interface currently
    /// holds one. `None` materialises the config without an explicit
    /// `interface:` line so the resolver falls back to its default bind.
    pub fn bind_ip(&self, vlan: VlanId) -> Result<Option<Ipv4Addr>, ConfigError> {
        let interface = self.vlan_interface(vlan)?;
        let ip = interfaces::interface_ipv4(&interface);
        if ip.is_none() {
            warn!(interface = %interface, vlan = vlan.0, "No IPv4 address found for interface");
        }
        Ok(ip)
    }
}
