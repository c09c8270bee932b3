//! Renders the per-VLAN mesh hosts include file, writing (and reloading)
//! only when the rendered entries actually changed.

use crate::config_tree::layout;
use crate::system::ownership;
use std::collections::HashSet;
use std::net::IpAddr;
use std::path::Path;
use tracing::{debug, info, warn};
use warden_application::ports::ReloadPort;
use warden_domain::config::ResolverConfig;
use warden_domain::{DomainError, HostRecord, VlanId};

/// Collapse runs of whitespace so formatting differences never defeat
/// change detection.
fn normalize_entry(line: &str) -> String {
    line.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Render the include fragment and the normalised entry set used for
/// change detection. Duplicate hostnames are dropped (first seen wins);
/// unparseable addresses are skipped with a warning.
pub fn render_config(hosts: &[HostRecord], domain_suffix: &str) -> (String, HashSet<String>) {
    let mut lines = vec![
        format!("# Mesh-VPN hosts for {domain_suffix}"),
        "server:".to_string(),
    ];
    let mut entries = HashSet::new();
    let mut seen = HashSet::new();

    for host in hosts {
        let hostname = host.hostname.to_ascii_lowercase();
        if !seen.insert(hostname.clone()) {
            warn!(hostname = %hostname, "Skipping duplicate hostname");
            continue;
        }

        let fqdn = format!("{hostname}.{domain_suffix}");
        for ip in &host.ips {
            let parsed: IpAddr = match ip.parse() {
                Ok(addr) => addr,
                Err(_) => {
                    warn!(hostname = %hostname, ip = %ip, "Skipping invalid address");
                    continue;
                }
            };
            let record_type = if parsed.is_ipv4() { "A" } else { "AAAA" };

            let data = format!("  local-data: \"{fqdn}. IN {record_type} {ip}\"");
            entries.insert(normalize_entry(&data));
            lines.push(data);

            let ptr = format!("  local-data-ptr: \"{ip} {fqdn}\"");
            entries.insert(normalize_entry(&ptr));
            lines.push(ptr);
        }
    }

    (lines.join("\n") + "\n", entries)
}

/// Entry set of an existing include file. A missing or unreadable file is
/// an empty set, which forces a write.
pub fn read_existing_entries(path: &Path) -> HashSet<String> {
    let Ok(text) = std::fs::read_to_string(path) else {
        return HashSet::new();
    };
    text.lines()
        .filter(|line| {
            let line = line.trim();
            !line.starts_with('#') && (line.contains("local-data:") || line.contains("local-data-ptr:"))
        })
        .map(normalize_entry)
        .collect()
}

pub struct HostsSync {
    domain_suffix: String,
    force: bool,
    dry_run: bool,
}

impl HostsSync {
    pub fn new(domain_suffix: impl Into<String>) -> Self {
        Self {
            domain_suffix: domain_suffix.into(),
            force: false,
            dry_run: false,
        }
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Bring one VLAN's include file up to date. Returns `true` when the
    /// file was (or, in a dry run, would have been) rewritten.
    pub fn sync_vlan_dir(
        &self,
        vlan: VlanId,
        vlan_dir: &Path,
        hosts: &[HostRecord],
        resolver: &ResolverConfig,
    ) -> Result<bool, DomainError> {
        let config_file = layout::mesh_hosts_file(vlan_dir);
        let (content, new_entries) = render_config(hosts, &self.domain_suffix);
        let existing = read_existing_entries(&config_file);

        if existing == new_entries && !self.force {
            debug!(vlan = vlan.0, "No changes detected, skipping update");
            return Ok(false);
        }

        if self.dry_run {
            info!(vlan = vlan.0, file = %config_file.display(), "Dry run, would rewrite");
            return Ok(true);
        }

        std::fs::create_dir_all(layout::local_dir(vlan_dir))?;
        std::fs::write(&config_file, content)?;
        ownership::chown_path(&config_file, &resolver.user)?;
        info!(
            vlan = vlan.0,
            entries = new_entries.len(),
            file = %config_file.display(),
            "Mesh hosts written"
        );
        Ok(true)
    }

    /// Sync every VLAN directory under `base_dir`, reloading only the
    /// resolvers whose file changed. Returns the number of rewritten
    /// VLANs.
    pub async fn sync_all(
        &self,
        base_dir: &Path,
        hosts: &[HostRecord],
        resolver: &ResolverConfig,
        reload: &dyn ReloadPort,
    ) -> Result<usize, DomainError> {
        let mut updated = 0;
        for (vlan, vlan_dir) in layout::discover_vlan_dirs(base_dir) {
            match self.sync_vlan_dir(vlan, &vlan_dir, hosts, resolver) {
                Ok(true) => {
                    updated += 1;
                    if !self.dry_run {
                        if let Err(e) = reload.request_reload(vlan).await {
                            warn!(vlan = vlan.0, error = %e, "Reload after hosts sync failed");
                        }
                    }
                }
                Ok(false) => {}
                Err(e) => warn!(vlan = vlan.0, error = %e, "Hosts sync failed for VLAN"),
            }
        }
        Ok(updated)
    }
}
