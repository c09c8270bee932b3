//! Per-VLAN ingestion task: owns one resolver child and the dedup buffer
//! between its log output and the store.

use crate::resolver::spawn::ResolverHandle;
use crate::system::process;
use nix::sys::signal::Signal;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use warden_application::ports::QueryStore;
use warden_application::{log_parser, DedupBuffer, IngestStats};
use warden_domain::VlanId;

/// Upper bound on how long a quiet VLAN can go without a flush check.
const FLUSH_TICK: Duration = Duration::from_secs(1);

pub struct Ingestor {
    vlan: VlanId,
    resolver: ResolverHandle,
    store: Arc<dyn QueryStore>,
    stats: Arc<IngestStats>,
    reload_rx: mpsc::Receiver<()>,
    shutdown: CancellationToken,
    shutdown_grace: Duration,
}

impl Ingestor {
    pub fn new(
        vlan: VlanId,
        resolver: ResolverHandle,
        store: Arc<dyn QueryStore>,
        stats: Arc<IngestStats>,
        reload_rx: mpsc::Receiver<()>,
        shutdown: CancellationToken,
        shutdown_grace: Duration,
    ) -> Self {
        Self {
            vlan,
            resolver,
            store,
            stats,
            reload_rx,
            shutdown,
            shutdown_grace,
        }
    }

    pub fn resolver_pid(&self) -> i32 {
        self.resolver.pid
    }

    /// Line loop: parse, dedup, flush. Runs until shutdown or resolver
    /// exit, then drains the buffer and terminates the child. A reload
    /// request is honoured between lines, never mid-write.
    pub async fn run(mut self) {
        if let Err(e) = self.store.ensure_schema().await {
            warn!(vlan = self.vlan.0, error = %e, "Schema check failed, continuing");
        }

        let mut buffer = DedupBuffer::new();
        info!(vlan = self.vlan.0, pid = self.resolver.pid, "Ingestor started");

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    debug!(vlan = self.vlan.0, "Shutdown requested");
                    break;
                }
                Some(()) = self.reload_rx.recv() => {
                    info!(vlan = self.vlan.0, pid = self.resolver.pid, "Forwarding reload to resolver");
                    process::signal_if_alive(self.resolver.pid, Signal::SIGHUP);
                }
                read = tokio::time::timeout(FLUSH_TICK, self.resolver.lines.recv()) => {
                    match read {
                        Ok(Some(line)) => {
                            self.ingest_line(&line, &mut buffer).await;
                        }
                        Ok(None) => {
                            warn!(vlan = self.vlan.0, "Resolver output closed");
                            break;
                        }
                        Err(_) => {
                            let outcome = buffer.flush_due(self.store.as_ref()).await;
                            self.stats.add_errors(outcome.errors as u64);
                            self.stats.set_pending(buffer.len() as u64);
                        }
                    }
                }
            }
        }

        let outcome = buffer.drain(self.store.as_ref()).await;
        self.stats.add_errors(outcome.errors as u64);
        self.stats.set_pending(0);
        self.stop_resolver().await;
        info!(vlan = self.vlan.0, "Ingestor stopped");
    }

    async fn ingest_line(&mut self, line: &str, buffer: &mut DedupBuffer) {
        if log_parser::is_candidate(line) {
            self.stats.record_processed();
            let now = chrono::Utc::now().timestamp();
            if let Some(event) = log_parser::parse(line, now, self.vlan) {
                self.stats.record_event(event.status);
                let outcome = buffer.offer(event, self.store.as_ref()).await;
                self.stats.add_errors(outcome.errors as u64);
            }
        }
        let outcome = buffer.flush_due(self.store.as_ref()).await;
        self.stats.add_errors(outcome.errors as u64);
        self.stats.set_pending(buffer.len() as u64);
    }

    async fn stop_resolver(&mut self) {
        if let Ok(Some(_)) = self.resolver.child.try_wait() {
            return;
        }
        process::signal_if_alive(self.resolver.pid, Signal::SIGTERM);
        match tokio::time::timeout(self.shutdown_grace, self.resolver.child.wait()).await {
            Ok(_) => debug!(vlan = self.vlan.0, "Resolver exited"),
            Err(_) => {
                warn!(vlan = self.vlan.0, pid = self.resolver.pid, "Resolver ignored SIGTERM, killing");
                let _ = self.resolver.child.kill().await;
            }
        }
    }
}
