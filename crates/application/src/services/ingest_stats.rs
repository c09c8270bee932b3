use std::sync::atomic::{AtomicU64, Ordering};
use warden_domain::QueryStatus;

/// Live counters for one ingestor, read by the supervisor at its own
/// cadence. Not part of any persisted contract.
#[derive(Debug, Default)]
pub struct IngestStats {
    processed: AtomicU64,
    allowed: AtomicU64,
    blocked: AtomicU64,
    errors: AtomicU64,
    pending: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub processed: u64,
    pub allowed: u64,
    pub blocked: u64,
    pub errors: u64,
    pub pending: u64,
}

impl IngestStats {
    pub fn record_processed(&self) {
        self.processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_event(&self, status: QueryStatus) {
        match status {
            QueryStatus::Allowed => self.allowed.fetch_add(1, Ordering::Relaxed),
            QueryStatus::Blocked => self.blocked.fetch_add(1, Ordering::Relaxed),
        };
    }

    pub fn add_errors(&self, n: u64) {
        if n > 0 {
            self.errors.fetch_add(n, Ordering::Relaxed);
        }
    }

    pub fn set_pending(&self, n: u64) {
        self.pending.store(n, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            processed: self.processed.load(Ordering::Relaxed),
            allowed: self.allowed.load(Ordering::Relaxed),
            blocked: self.blocked.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            pending: self.pending.load(Ordering::Relaxed),
        }
    }
}
