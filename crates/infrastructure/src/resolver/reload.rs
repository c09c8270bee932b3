//! Descriptor-based reload fan-out for standalone commands that run
//! outside the supervisor process.

use crate::config_tree::layout;
use crate::system::process;
use async_trait::async_trait;
use nix::sys::signal::Signal;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use warden_application::ports::ReloadPort;
use warden_domain::{DomainError, PidDescriptor, VlanId};

pub struct PidFileReload {
    base_dir: PathBuf,
}

impl PidFileReload {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    fn resolver_pid(vlan_dir: &Path) -> Option<i32> {
        let text = std::fs::read_to_string(PidDescriptor::path_in(vlan_dir)).ok()?;
        PidDescriptor::parse(&text).resolver_pid
    }
}

#[async_trait]
impl ReloadPort for PidFileReload {
    async fn request_reload(&self, vlan: VlanId) -> Result<(), DomainError> {
        let vlan_dir = self.base_dir.join(vlan.dir_name());
        match Self::resolver_pid(&vlan_dir) {
            Some(pid) if process::pid_alive(pid) => {
                process::send_signal(pid, Signal::SIGHUP)?;
                info!(vlan = vlan.0, pid, "Resolver reloaded");
                Ok(())
            }
            _ => {
                warn!(vlan = vlan.0, "No live resolver PID for VLAN, broadcasting reload");
                self.reload_all().await
            }
        }
    }

    async fn reload_all(&self) -> Result<(), DomainError> {
        let mut reloaded = 0;
        for (vlan, vlan_dir) in layout::discover_vlan_dirs(&self.base_dir) {
            if let Some(pid) = Self::resolver_pid(&vlan_dir) {
                process::signal_if_alive(pid, Signal::SIGHUP);
                reloaded += 1;
            } else {
                warn!(vlan = vlan.0, "No PID descriptor for VLAN");
            }
        }
        info!(reloaded, "Broadcast reload complete");
        Ok(())
    }
}
