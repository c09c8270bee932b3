use std::path::{Path, PathBuf};

/// Line-oriented `key:value` record describing one VLAN's running
/// resolver, written next to its config file.
///
/// The key names are fixed wire format; `python_pid` is the supervising
/// process and `unbound_pid` the resolver itself. Every field is optional
/// on read: descriptors from older runs may omit keys, and the PIDs they
/// carry may no longer exist.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PidDescriptor {
    pub screen_session: Option<String>,
    pub screen_pid: Option<i32>,
    pub supervisor_pid: Option<i32>,
    pub resolver_pid: Option<i32>,
    pub vlan_id: Option<u32>,
    pub config_file: Option<PathBuf>,
}

impl PidDescriptor {
    pub const FILE_NAME: &'static str = "unbound.pid";

    /// Path of the descriptor inside a VLAN config directory.
    pub fn path_in(config_dir: &Path) -> PathBuf {
        config_dir.join(Self::FILE_NAME)
    }

    pub fn parse(text: &str) -> Self {
        let mut desc = Self::default();
        for line in text.lines() {
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim();
            match key.trim() {
                "screen_session" => desc.screen_session = Some(value.to_string()),
                "screen_pid" => desc.screen_pid = value.parse().ok(),
                "python_pid" => desc.supervisor_pid = value.parse().ok(),
                "unbound_pid" => desc.resolver_pid = value.parse().ok(),
                "vlan_id" => desc.vlan_id = value.parse().ok(),
                "config_file" => desc.config_file = Some(PathBuf::from(value)),
                _ => {}
            }
        }
        desc
    }

    /// Render in wire format. Absent fields are omitted, matching what
    /// readers must tolerate anyway.
    pub fn render(&self) -> String {
        let mut out = String::new();
        if let Some(s) = &self.screen_session {
            out.push_str(&format!("screen_session:{s}\n"));
        }
        if let Some(p) = self.screen_pid {
            out.push_str(&format!("screen_pid:{p}\n"));
        }
        if let Some(p) = self.supervisor_pid {
            out.push_str(&format!("python_pid:{p}\n"));
        }
        if let Some(p) = self.resolver_pid {
            out.push_str(&format!("unbound_pid:{p}\n"));
        }
        if let Some(v) = self.vlan_id {
            out.push_str(&format!("vlan_id:{v}\n"));
        }
        if let Some(f) = &self.config_file {
            out.push_str(&format!("config_file:{}\n", f.display()));
        }
        out
    }
}
