use crate::bootstrap;
use std::sync::Arc;
use tokio::signal::unix::{signal, SignalKind};
use tokio_util::sync::CancellationToken;
use tracing::info;
use warden_application::ports::{QueryStore, ReloadPort};
use warden_domain::Config;
use warden_infrastructure::resolver::Supervisor;
use warden_jobs::{BlocklistRefreshJob, HostsSyncJob, JobRunner};

pub async fn execute(config: Arc<Config>) -> anyhow::Result<()> {
    let store = bootstrap::database::init_store(&config).await?;
    let store: Arc<dyn QueryStore> = store;

    let supervisor = Supervisor::start(Arc::clone(&config), Arc::clone(&store)).await?;

    let jobs_shutdown = CancellationToken::new();
    let mut runner = JobRunner::new();
    if config.hosts.sync_enabled {
        runner = runner.with_hosts_sync(
            HostsSyncJob::new(
                Arc::clone(&config),
                Arc::clone(&supervisor) as Arc<dyn ReloadPort>,
            )
            .with_cancellation(jobs_shutdown.child_token()),
        );
    }
    if config.blocklists.refresh_enabled {
        runner = runner.with_blocklist_refresh(
            BlocklistRefreshJob::new(
                Arc::clone(&config),
                Arc::clone(&store),
                Arc::clone(&supervisor) as Arc<dyn ReloadPort>,
            )
            .with_cancellation(jobs_shutdown.child_token()),
        );
    }
    runner.start().await;

    let mut sighup = signal(SignalKind::hangup())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut stats_tick = tokio::time::interval(std::time::Duration::from_secs(60));
    stats_tick.tick().await;

    loop {
        tokio::select! {
            _ = sighup.recv() => {
                info!("SIGHUP received, fanning out reload");
                supervisor.reenumerate_and_reload().await;
            }
            _ = stats_tick.tick() => {
                supervisor.log_stats();
            }
            _ = sigterm.recv() => {
                info!("SIGTERM received");
                break;
            }
            _ = sigint.recv() => {
                info!("SIGINT received");
                break;
            }
        }
    }

    jobs_shutdown.cancel();
    supervisor.shutdown_all().await;
    Ok(())
}
