use nix::errno::Errno;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use std::path::Path;
use tracing::debug;
use warden_domain::DomainError;

/// True when a process with this PID exists and is signallable.
pub fn pid_alive(pid: i32) -> bool {
    kill(Pid::from_raw(pid), None).is_ok()
}

/// Deliver a signal, surfacing failures.
pub fn send_signal(pid: i32, signal: Signal) -> Result<(), DomainError> {
    kill(Pid::from_raw(pid), signal)
        .map_err(|e| DomainError::Signal(format!("{} to pid {}: {}", signal, pid, e)))
}

/// Deliver a signal to a PID that may already be gone. A vanished target
/// is normal during teardown (descriptors outlive their processes), so
/// ESRCH is logged at debug and swallowed.
pub fn signal_if_alive(pid: i32, signal: Signal) {
    match kill(Pid::from_raw(pid), signal) {
        Ok(()) => debug!(pid, %signal, "Signal delivered"),
        Err(Errno::ESRCH) => debug!(pid, "Process already gone"),
        Err(e) => debug!(pid, %signal, error = %e, "Signal failed"),
    }
}

/// PIDs of live processes whose command line contains `pattern`,
/// excluding this process. Used as a teardown fallback when PID
/// descriptors are missing or stale.
pub fn find_pids_by_cmdline(pattern: &str) -> Vec<i32> {
    let own_pid = std::process::id() as i32;
    let mut pids = Vec::new();

    let Ok(entries) = std::fs::read_dir("/proc") else {
        return pids;
    };

    for entry in entries.flatten() {
        let Some(pid) = entry
            .file_name()
            .to_str()
            .and_then(|n| n.parse::<i32>().ok())
        else {
            continue;
        };
        if pid == own_pid {
            continue;
        }
        let cmdline_path = Path::new("/proc").join(pid.to_string()).join("cmdline");
        let Ok(raw) = std::fs::read(&cmdline_path) else {
            continue;
        };
        let cmdline: String = raw
            .split(|b| *b == 0)
            .filter(|part| !part.is_empty())
            .map(|part| String::from_utf8_lossy(part))
            .collect::<Vec<_>>()
            .join(" ");
        if cmdline.contains(pattern) {
            pids.push(pid);
        }
    }

    pids
}
