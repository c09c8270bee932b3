//! Spawns one resolver child in verbose debug mode with both output
//! pipes funnelled into a single line channel.

use crate::system::process;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tracing::{debug, info};
use warden_domain::config::ResolverConfig;
use warden_domain::DomainError;

const LINE_CHANNEL_CAPACITY: usize = 1024;
const READY_POLL_INTERVAL: Duration = Duration::from_millis(100);

pub struct ResolverHandle {
    pub pid: i32,
    pub child: Child,
    /// Merged stdout+stderr lines. Closes when the resolver exits.
    pub lines: mpsc::Receiver<String>,
}

pub async fn spawn_resolver(
    resolver: &ResolverConfig,
    config_file: &Path,
) -> Result<ResolverHandle, DomainError> {
    let args = resolver.spawn_args(config_file);
    debug!(binary = %resolver.binary.display(), ?args, "Spawning resolver");

    let mut child = Command::new(&resolver.binary)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| DomainError::Spawn(format!("{}: {}", resolver.binary.display(), e)))?;

    let pid = child
        .id()
        .ok_or_else(|| DomainError::Spawn("resolver exited before a PID was visible".to_string()))?
        as i32;

    let (tx, rx) = mpsc::channel(LINE_CHANNEL_CAPACITY);
    if let Some(stdout) = child.stdout.take() {
        forward_lines(stdout, tx.clone());
    }
    if let Some(stderr) = child.stderr.take() {
        forward_lines(stderr, tx);
    }

    wait_ready(
        &mut child,
        pid,
        Duration::from_secs(resolver.spawn_grace_secs),
    )
    .await?;

    info!(pid, config = %config_file.display(), "Resolver running");
    Ok(ResolverHandle { pid, child, lines: rx })
}

fn forward_lines<R>(reader: R, tx: mpsc::Sender<String>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if tx.send(line).await.is_err() {
                break;
            }
        }
    });
}

/// Confirm the child survives its startup window. A resolver with a bad
/// config exits within a beat of spawning; catching that here turns the
/// slot into a clean `Failed` instead of an ingestor that reads nothing.
async fn wait_ready(child: &mut Child, pid: i32, grace: Duration) -> Result<(), DomainError> {
    tokio::time::sleep(READY_POLL_INTERVAL * 2).await;
    let deadline = tokio::time::Instant::now() + grace;

    loop {
        if let Some(status) = child
            .try_wait()
            .map_err(|e| DomainError::Spawn(e.to_string()))?
        {
            return Err(DomainError::Spawn(format!(
                "resolver exited during startup: {status}"
            )));
        }
        if process::pid_alive(pid) {
            return Ok(());
        }
        if tokio::time::Instant::now() >= deadline {
            return Err(DomainError::Spawn(format!(
                "PID {pid} not observable within {}s",
                grace.as_secs()
            )));
        }
        tokio::time::sleep(READY_POLL_INTERVAL).await;
    }
}
