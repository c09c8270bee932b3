use crate::bootstrap;
use std::sync::Arc;
use tracing::{info, warn};
use warden_application::ports::ReloadPort;
use warden_domain::Config;
use warden_infrastructure::blocklist::BlocklistBuilder;
use warden_infrastructure::config_tree::layout;
use warden_infrastructure::resolver::PidFileReload;

/// Rebuild every VLAN's blocklist include files, then reload each VLAN
/// whose files were rewritten.
pub async fn execute(config: Arc<Config>) -> anyhow::Result<()> {
    let store = bootstrap::database::init_store(&config).await?;
    let builder = BlocklistBuilder::new(&config.blocklists);
    let reload = PidFileReload::new(&config.paths.base_dir);

    for (vlan, vlan_dir) in layout::discover_vlan_dirs(&config.paths.base_dir) {
        match builder
            .sync_vlan(vlan, &vlan_dir, store.as_ref(), &config.resolver)
            .await
        {
            Ok(written) => {
                info!(vlan = vlan.0, written, "Blocklists rebuilt");
                if written > 0 {
                    if let Err(e) = reload.request_reload(vlan).await {
                        warn!(vlan = vlan.0, error = %e, "Reload failed");
                    }
                }
            }
            Err(e) => warn!(vlan = vlan.0, error = %e, "Blocklist sync failed for VLAN"),
        }
    }
    Ok(())
}
