use crate::bootstrap;
use std::sync::Arc;
use tracing::info;
use warden_domain::{BlocklistSource, Config, VlanId};
use warden_infrastructure::blocklist::BlocklistBuilder;

/// Fetch a single source and write its include file. The resolver is not
/// reloaded here; reloads are the supervisor's job.
pub async fn execute(
    config: Arc<Config>,
    name: String,
    url: String,
    vlan_id: u32,
) -> anyhow::Result<()> {
    let store = bootstrap::database::init_store(&config).await?;

    let source = BlocklistSource {
        id: 0,
        name,
        url,
        vlan_id,
    };
    let vlan_dir = config.paths.vlan_dir(VlanId(vlan_id));

    let builder = BlocklistBuilder::new(&config.blocklists);
    let written = builder
        .build_source(&source, &vlan_dir, store.as_ref(), &config.resolver)
        .await?;

    info!(source = %source.name, vlan = vlan_id, domains = written, "Blocklist fetched");
    Ok(())
}
