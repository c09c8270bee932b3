use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use warden_application::ports::ReloadPort;
use warden_domain::Config;
use warden_infrastructure::hosts::{tailscale, HostsSync};

/// Periodically mirrors the mesh-VPN host map into every VLAN's local
/// include file, reloading only the resolvers whose file changed.
pub struct HostsSyncJob {
    config: Arc<Config>,
    reload: Arc<dyn ReloadPort>,
    interval_secs: u64,
    shutdown: CancellationToken,
}

impl HostsSyncJob {
    pub fn new(config: Arc<Config>, reload: Arc<dyn ReloadPort>) -> Self {
        let interval_secs = config.hosts.sync_interval_secs;
        Self {
            config,
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
            "Starting mesh hosts sync job"
        );

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs));
            interval.tick().await;

            loop {
                tokio::select! {
                    _ = self.shutdown.cancelled() => {
                        info!("HostsSyncJob: shutting down");
                        break;
                    }
                    _ = interval.tick() => {
                        match self.sync_once().await {
                            Ok(updated) => info!(updated, "HostsSyncJob: sync completed"),
                            Err(e) => error!(error = %e, "HostsSyncJob: sync failed"),
                        }
                    }
                }
            }
        });
    }

    async fn sync_once(&self) -> Result<usize, warden_domain::DomainError> {
        let hosts = tailscale::collect_hosts().await?;
        HostsSync::new(self.config.hosts.domain_suffix.clone())
            .sync_all(
                &self.config.paths.base_dir,
                &hosts,
                &self.config.resolver,
                self.reload.as_ref(),
            )
            .await
    }
}
