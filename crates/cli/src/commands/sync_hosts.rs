use std::sync::Arc;
use tracing::info;
use warden_application::ports::ReloadPort;
use warden_domain::{Config, VlanId};
use warden_infrastructure::hosts::{tailscale, HostsSync};
use warden_infrastructure::resolver::PidFileReload;

pub async fn execute(
    config: Arc<Config>,
    vlan_id: Option<u32>,
    force: bool,
    dry_run: bool,
    domain: Option<String>,
) -> anyhow::Result<()> {
    let hosts = tailscale::collect_hosts().await?;
    if hosts.is_empty() {
        anyhow::bail!("no hosts found in the mesh network");
    }
    info!(count = hosts.len(), "Mesh hosts collected");

    let suffix = domain.unwrap_or_else(|| config.hosts.domain_suffix.clone());
    let sync = HostsSync::new(suffix).with_force(force).with_dry_run(dry_run);
    let reload = PidFileReload::new(&config.paths.base_dir);

    match vlan_id {
        Some(id) => {
            let vlan = VlanId(id);
            let vlan_dir = config.paths.vlan_dir(vlan);
            if !vlan_dir.is_dir() {
                anyhow::bail!("VLAN directory {} does not exist", vlan_dir.display());
            }
            let wrote = sync.sync_vlan_dir(vlan, &vlan_dir, &hosts, &config.resolver)?;
            if wrote && !dry_run {
                reload.request_reload(vlan).await?;
            }
            info!(vlan = id, updated = wrote, "Hosts sync finished");
        }
        None => {
            let updated = sync
                .sync_all(&config.paths.base_dir, &hosts, &config.resolver, &reload)
                .await?;
            info!(updated, "Hosts sync finished");
        }
    }
    Ok(())
}
