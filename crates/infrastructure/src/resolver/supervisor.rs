//! Top-level orchestrator: enumerates VLANs, tears down prior resolver
//! generations, materialises config trees, and runs one ingestor per
//! VLAN.

use crate::config_tree::{layout, materialise};
use crate::resolver::{spawn_resolver, Ingestor};
use crate::system::{apparmor, process, NetConfig};
use async_trait::async_trait;
use dashmap::DashMap;
use futures::future::join_all;
use nix::sys::signal::Signal;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use warden_application::ports::{QueryStore, ReloadPort};
use warden_application::IngestStats;
use warden_domain::config::{PathsConfig, ResolverConfig};
use warden_domain::{Config, ConfigError, DomainError, PidDescriptor, VlanEntry, VlanId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    Empty,
    Starting,
    Running,
    Failed,
}

struct VlanSlot {
    state: SlotState,
    resolver_pid: Option<i32>,
    stats: Arc<IngestStats>,
    reload_tx: Option<mpsc::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl VlanSlot {
    fn starting() -> Self {
        Self {
            state: SlotState::Starting,
            resolver_pid: None,
            stats: Arc::new(IngestStats::default()),
            reload_tx: None,
            task: None,
        }
    }
}

pub struct Supervisor {
    config: Arc<Config>,
    store: Arc<dyn QueryStore>,
    net: NetConfig,
    slots: DashMap<u32, VlanSlot>,
    shutdown: CancellationToken,
}

impl Supervisor {
    /// Bring the whole fleet up. Start-up errors (network config, VLAN
    /// enumeration, schema) are fatal; a single VLAN failing to launch
    /// marks only that slot `Failed`.
    pub async fn start(
        config: Arc<Config>,
        store: Arc<dyn QueryStore>,
    ) -> Result<Arc<Self>, DomainError> {
        apparmor::disable_for_resolver().await;
        teardown_previous(&config).await;

        store.ensure_schema().await?;

        let net = NetConfig::load(&config.paths.network_config)?;
        net.internal_interface()?;

        let vlans = enumerate_vlans(&config.paths)?;
        info!(count = vlans.len(), "Starting resolver fleet");

        let supervisor = Arc::new(Self {
            config,
            store,
            net,
            slots: DashMap::new(),
            shutdown: CancellationToken::new(),
        });

        for vlan in vlans {
            if let Err(e) = supervisor.start_vlan(vlan).await {
                error!(vlan = vlan.0, error = %e, "VLAN slot failed");
            }
        }

        Ok(supervisor)
    }

    async fn start_vlan(&self, vlan: VlanId) -> Result<(), DomainError> {
        self.slots.insert(vlan.0, VlanSlot::starting());
        match self.launch_vlan(vlan).await {
            Ok(()) => Ok(()),
            Err(e) => {
                if let Some(mut slot) = self.slots.get_mut(&vlan.0) {
                    slot.state = SlotState::Failed;
                }
                Err(e)
            }
        }
    }

    async fn launch_vlan(&self, vlan: VlanId) -> Result<(), DomainError> {
        let vlan_dir = self.config.paths.vlan_dir(vlan);
        let bind_ip = self.net.bind_ip(vlan)?;

        materialise(
            &vlan_dir,
            &self.config.paths.template_dir,
            bind_ip,
            &self.config.resolver,
        )?;

        let conf_file = vlan_dir.join(ResolverConfig::CONF_FILE_NAME);
        let resolver = spawn_resolver(&self.config.resolver, &conf_file).await?;
        let resolver_pid = resolver.pid;

        let stats = Arc::new(IngestStats::default());
        let (reload_tx, reload_rx) = mpsc::channel(4);
        let ingestor = Ingestor::new(
            vlan,
            resolver,
            Arc::clone(&self.store),
            Arc::clone(&stats),
            reload_rx,
            self.shutdown.child_token(),
            Duration::from_secs(self.config.resolver.shutdown_grace_secs),
        );
        let task = tokio::spawn(ingestor.run());

        let own_pid = std::process::id() as i32;
        let descriptor = PidDescriptor {
            screen_session: Some(format!("unbound_{}", vlan.dir_name())),
            screen_pid: Some(own_pid),
            supervisor_pid: Some(own_pid),
            resolver_pid: Some(resolver_pid),
            vlan_id: Some(vlan.0),
            config_file: Some(conf_file),
        };
        std::fs::write(PidDescriptor::path_in(&vlan_dir), descriptor.render())?;

        self.slots.insert(
            vlan.0,
            VlanSlot {
                state: SlotState::Running,
                resolver_pid: Some(resolver_pid),
                stats,
                reload_tx: Some(reload_tx),
                task: Some(task),
            },
        );
        info!(vlan = vlan.0, pid = resolver_pid, "VLAN slot running");
        Ok(())
    }

    pub fn slot_state(&self, vlan: VlanId) -> SlotState {
        self.slots
            .get(&vlan.0)
            .map(|s| s.state)
            .unwrap_or(SlotState::Empty)
    }

    pub fn stats(&self, vlan: VlanId) -> Option<Arc<IngestStats>> {
        self.slots.get(&vlan.0).map(|s| Arc::clone(&s.stats))
    }

    /// One log line per slot with its live ingestion counters.
    pub fn log_stats(&self) {
        for entry in self.slots.iter() {
            let snapshot = entry.stats.snapshot();
            info!(
                vlan = *entry.key(),
                state = ?entry.state,
                processed = snapshot.processed,
                allowed = snapshot.allowed,
                blocked = snapshot.blocked,
                errors = snapshot.errors,
                pending = snapshot.pending,
                "Ingestion counters"
            );
        }
    }

    /// Reload one VLAN's resolver via its ingestor; with no live slot the
    /// reload is broadcast instead.
    pub async fn reload_vlan(&self, vlan: VlanId) -> Result<(), DomainError> {
        let tx = self
            .slots
            .get(&vlan.0)
            .and_then(|slot| slot.reload_tx.clone());
        match tx {
            Some(tx) => tx
                .send(())
                .await
                .map_err(|_| DomainError::Signal(format!("ingestor for VLAN {} is gone", vlan.0))),
            None => {
                warn!(vlan = vlan.0, "No ingestor for VLAN, broadcasting reload");
                self.broadcast_reload().await;
                Ok(())
            }
        }
    }

    async fn broadcast_reload(&self) {
        let senders: Vec<(u32, mpsc::Sender<()>)> = self
            .slots
            .iter()
            .filter_map(|entry| entry.reload_tx.clone().map(|tx| (*entry.key(), tx)))
            .collect();
        for (vlan, tx) in senders {
            if tx.send(()).await.is_err() {
                warn!(vlan, "Reload request dropped, ingestor gone");
            }
        }
    }

    /// SIGHUP behaviour: re-read the VLAN list and forward the reload to
    /// every enumerated VLAN's ingestor.
    pub async fn reenumerate_and_reload(&self) {
        match enumerate_vlans(&self.config.paths) {
            Ok(vlans) => {
                info!(count = vlans.len(), "Re-enumerated VLANs, fanning out reload");
                for vlan in vlans {
                    if let Err(e) = self.reload_vlan(vlan).await {
                        warn!(vlan = vlan.0, error = %e, "Reload failed");
                    }
                }
            }
            Err(e) => warn!(error = %e, "VLAN re-enumeration failed"),
        }
    }

    /// Tear every slot down in parallel: ingestors get the cancellation,
    /// terminate their resolvers softly, and stragglers are killed after
    /// the grace budget.
    pub async fn shutdown_all(&self) {
        info!("Supervisor shutting down");
        self.shutdown.cancel();

        let grace = Duration::from_secs(self.config.resolver.shutdown_grace_secs);
        let keys: Vec<u32> = self.slots.iter().map(|e| *e.key()).collect();

        let mut waits = Vec::new();
        for key in keys {
            if let Some((_, mut slot)) = self.slots.remove(&key) {
                let task = slot.task.take();
                let pid = slot.resolver_pid;
                waits.push(async move {
                    if let Some(task) = task {
                        if tokio::time::timeout(grace + Duration::from_secs(3), task)
                            .await
                            .is_err()
                        {
                            warn!(vlan = key, "Ingestor did not stop in time, aborting");
                            if let Some(pid) = pid {
                                process::signal_if_alive(pid, Signal::SIGKILL);
                            }
                        }
                    }
                });
            }
        }
        join_all(waits).await;
        info!("All VLAN slots empty");
    }
}

#[async_trait]
impl ReloadPort for Supervisor {
    async fn request_reload(&self, vlan: VlanId) -> Result<(), DomainError> {
        self.reload_vlan(vlan).await
    }

    async fn reload_all(&self) -> Result<(), DomainError> {
        self.broadcast_reload().await;
        Ok(())
    }
}

/// VLAN 0 plus the ids enumerated in `vlans.json`.
pub fn enumerate_vlans(paths: &PathsConfig) -> Result<Vec<VlanId>, DomainError> {
    let mut vlans = vec![VlanId::DEFAULT];

    let text = std::fs::read_to_string(&paths.vlans_file).map_err(|e| {
        ConfigError::Read {
            path: paths.vlans_file.display().to_string(),
            message: e.to_string(),
        }
    })?;
    let entries: Vec<VlanEntry> = serde_json::from_str(&text).map_err(|e| ConfigError::Parse {
        path: paths.vlans_file.display().to_string(),
        message: e.to_string(),
    })?;

    for entry in entries {
        let vlan = entry.vlan_id();
        if !vlan.is_default() && !vlans.contains(&vlan) {
            vlans.push(vlan);
        }
    }
    Ok(vlans)
}

/// Kill everything a previous supervisor generation left behind:
/// descriptor PIDs first (resolver, then supervising process, then any
/// wrapper session), then a command-line scan for strays, then verify.
async fn teardown_previous(config: &Config) {
    let own_pid = std::process::id() as i32;
    let mut descriptors = 0;

    for (vlan, vlan_dir) in layout::discover_vlan_dirs(&config.paths.base_dir) {
        let pid_file = PidDescriptor::path_in(&vlan_dir);
        let Ok(text) = std::fs::read_to_string(&pid_file) else {
            continue;
        };
        let descriptor = PidDescriptor::parse(&text);
        debug!(vlan = vlan.0, ?descriptor, "Terminating prior instance");

        if let Some(pid) = descriptor.resolver_pid {
            if pid > 1 && pid != own_pid {
                process::signal_if_alive(pid, Signal::SIGKILL);
            }
        }
        if let Some(pid) = descriptor.supervisor_pid {
            if pid > 1 && pid != own_pid {
                process::signal_if_alive(pid, Signal::SIGKILL);
            }
        }
        if let Some(session) = &descriptor.screen_session {
            let _ = tokio::process::Command::new("screen")
                .args(["-S", session, "-X", "quit"])
                .status()
                .await;
        }
        descriptors += 1;
    }

    if descriptors > 0 {
        tokio::time::sleep(Duration::from_secs(2)).await;
    }

    let pattern = config.resolver.process_pattern();
    let strays = process::find_pids_by_cmdline(&pattern);
    if !strays.is_empty() {
        warn!(count = strays.len(), "Killing stray resolver processes");
        for pid in &strays {
            process::signal_if_alive(*pid, Signal::SIGKILL);
        }
        tokio::time::sleep(Duration::from_secs(1)).await;

        let remaining = process::find_pids_by_cmdline(&pattern);
        if remaining.is_empty() {
            info!("All prior resolver processes terminated");
        } else {
            warn!(count = remaining.len(), "Resolver processes still running after teardown");
        }
    }
}
