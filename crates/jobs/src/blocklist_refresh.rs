use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use warden_application::ports::{QueryStore, ReloadPort};
use warden_domain::Config;
use warden_infrastructure::blocklist::BlocklistBuilder;
use warden_infrastructure::config_tree::layout;

/// Periodically rebuilds every VLAN's blocklist include files from the
/// registered sources, reloading a VLAN after its files were rewritten.
pub struct BlocklistRefreshJob {
    config: Arc<Config>,
    store: Arc<dyn QueryStore>,
    reload: Arc<dyn ReloadPort>,
    interval_secs: u64,
    shutdown: CancellationToken,
}

impl BlocklistRefreshJob {
    pub fn new(
        config: Arc<Config>,
        store: Arc<dyn QueryStore>,
        reload: Arc<dyn ReloadPort>,
    ) -> Self {
        let interval_secs = config.blocklists.refresh_interval_secs;
        Self {
            config,
            store,
            reload,
            interval_secs,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_interval(mut self, interval_secs: u64) -> Self {
        self.interval_secs = interval_secs;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    pub async fn start(self: Arc<Self>) {
        info!(
            interval_secs = self.interval_secs,
            "Starting blocklist refresh job"
        );

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs));
            interval.tick().await;

            loop {
                tokio::select! {
                    _ = self.shutdown.cancelled() => {
                        info!("BlocklistRefreshJob: shutting down");
                        break;
                    }
                    _ = interval.tick() => {
                        self.refresh_once().await;
                    }
                }
            }
        });
    }

    async fn refresh_once(&self) {
        let builder = BlocklistBuilder::new(&self.config.blocklists);
        for (vlan, vlan_dir) in layout::discover_vlan_dirs(&self.config.paths.base_dir) {
            match builder
                .sync_vlan(vlan, &vlan_dir, self.store.as_ref(), &self.config.resolver)
                .await
            {
                Ok(written) if written > 0 => {
                    info!(vlan = vlan.0, written, "Blocklists rebuilt");
                    if let Err(e) = self.reload.request_reload(vlan).await {
                        warn!(vlan = vlan.0, error = %e, "Reload after refresh failed");
                    }
                }
                Ok(_) => {}
                Err(e) => error!(vlan = vlan.0, error = %e, "Blocklist refresh failed"),
            }
        }
    }
}
