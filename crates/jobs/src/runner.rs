use crate::{BlocklistRefreshJob, HostsSyncJob};
use std::sync::Arc;
use tracing::info;

/// Central orchestrator for all background jobs.
///
/// Use the builder pattern to register jobs, then call `.start()` once.
pub struct JobRunner {
    hosts_sync: Option<HostsSyncJob>,
    blocklist_refresh: Option<BlocklistRefreshJob>,
}

impl JobRunner {
    pub fn new() -> Self {
        Self {
            hosts_sync: None,
            blocklist_refresh: None,
        }
    }

    pub fn with_hosts_sync(mut self, job: HostsSyncJob) -> Self {
        self.hosts_sync = Some(job);
        self
    }

    pub fn with_blocklist_refresh(mut self, job: BlocklistRefreshJob) -> Self {
        self.blocklist_refresh = Some(job);
        self
    }

    /// Start all registered background jobs.
    pub async fn start(self) {
        info!("Starting background job runner");

        if let Some(job) = self.hosts_sync {
            Arc::new(job).start().await;
        }

        if let Some(job) = self.blocklist_refresh {
            Arc::new(job).start().await;
        }

        info!("All background jobs started");
    }
}

impl Default for JobRunner {
    fn default() -> Self {
        Self::new()
    }
}
