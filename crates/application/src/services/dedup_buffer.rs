//! Bounded time-windowed dedup of allowed/blocked query events.
//!
//! An allowed log line and its localzone refusal arrive as two lines with
//! the same `(domain, second, vlan)`; holding events for a short window
//! lets the pair collapse into one stored row with the final status
//! `blocked`, so counts aren't double-booked. Capacity caps memory under
//! log bursts.

use crate::ports::QueryStore;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;
use warden_domain::{QueryEvent, QueryStatus};

/// How long an event may wait for its matching refusal line.
pub const DEDUP_WINDOW: Duration = Duration::from_secs(5);
/// Maximum events held at once.
pub const DEDUP_CAPACITY: usize = 25;

#[derive(Debug)]
struct PendingEvent {
    event: QueryEvent,
    first_seen: Instant,
    inserted: bool,
    db_id: Option<i64>,
}

/// Result of an `offer`/`flush_due` call. Store failures drop the
/// affected event and are surfaced here as counts, never as `Err`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FlushOutcome {
    pub flushed: usize,
    pub errors: usize,
}

impl FlushOutcome {
    fn absorb(&mut self, other: FlushOutcome) {
        self.flushed += other.flushed;
        self.errors += other.errors;
    }
}

/// Insertion-ordered window of pending events, owned by exactly one
/// ingestor. `first_seen` is monotonically non-decreasing along the
/// queue, so every due event sits at the front and events flush in FIFO
/// order.
#[derive(Debug)]
pub struct DedupBuffer {
    window: Duration,
    capacity: usize,
    entries: VecDeque<PendingEvent>,
}

impl Default for DedupBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl DedupBuffer {
    pub fn new() -> Self {
        Self::with_limits(DEDUP_WINDOW, DEDUP_CAPACITY)
    }

    pub fn with_limits(window: Duration, capacity: usize) -> Self {
        Self {
            window,
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Offer one parsed event.
    ///
    /// A key match coalesces: an incoming `blocked` upgrades an existing
    /// `allowed` (issuing a status update if the row was already
    /// inserted); anything else is ignored. With no match the event is
    /// appended, draining the whole buffer first if it is full.
    pub async fn offer(&mut self, event: QueryEvent, store: &dyn QueryStore) -> FlushOutcome {
        let mut outcome = FlushOutcome::default();

        if let Some(existing) = self
            .entries
            .iter_mut()
            .find(|p| p.event.key() == event.key())
        {
            if existing.event.status == QueryStatus::Allowed && event.status == QueryStatus::Blocked
            {
                existing.event.status = QueryStatus::Blocked;
                if existing.inserted {
                    if let Some(id) = existing.db_id {
                        if let Err(e) = store.update_query_status(id, QueryStatus::Blocked).await {
                            debug!(error = %e, id, "Status upgrade failed");
                            outcome.errors += 1;
                        }
                    }
                }
            }
            return outcome;
        }

        if self.entries.len() >= self.capacity {
            outcome.absorb(self.drain(store).await);
        }

        self.entries.push_back(PendingEvent {
            event,
            first_seen: Instant::now(),
            inserted: false,
            db_id: None,
        });
        outcome
    }

    /// Flush every event older than the window, in FIFO order.
    pub async fn flush_due(&mut self, store: &dyn QueryStore) -> FlushOutcome {
        let now = Instant::now();
        let window = self.window;
        self.flush_front(store, move |p| now.duration_since(p.first_seen) >= window)
            .await
    }

    /// Flush everything regardless of age. Used on capacity overflow and
    /// on ingestor shutdown.
    pub async fn drain(&mut self, store: &dyn QueryStore) -> FlushOutcome {
        self.flush_front(store, |_| true).await
    }

    async fn flush_front<F>(&mut self, store: &dyn QueryStore, due: F) -> FlushOutcome
    where
        F: Fn(&PendingEvent) -> bool,
    {
        let mut outcome = FlushOutcome::default();
        while let Some(front) = self.entries.front() {
            if !due(front) {
                break;
            }
            let mut pending = self.entries.pop_front().expect("front exists");
            if !pending.inserted {
                match store.insert_query(&pending.event).await {
                    Ok(id) => {
                        pending.inserted = true;
                        pending.db_id = Some(id);
                        outcome.flushed += 1;
                    }
                    Err(e) => {
                        debug!(error = %e, domain = %pending.event.domain, "Insert failed, dropping event");
                        outcome.errors += 1;
                    }
                }
            }
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
    use std::sync::Mutex;
    use warden_domain::{BlocklistSource, DomainError, VlanId};

    #[derive(Default)]
    struct RecordingStore {
        inserts: Mutex<Vec<QueryEvent>>,
        updates: Mutex<Vec<(i64, QueryStatus)>>,
        next_id: AtomicI64,
        fail_inserts: AtomicBool,
    }

    #[async_trait]
    impl QueryStore for RecordingStore {
        async fn ensure_schema(&self) -> Result<(), DomainError> {
            Ok(())
        }

        async fn insert_query(&self, event: &QueryEvent) -> Result<i64, DomainError> {
            if self.fail_inserts.load(Ordering::SeqCst) {
                return Err(DomainError::Store("down".to_string()));
            }
            let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
            self.inserts.lock().unwrap().push(event.clone());
            Ok(id)
        }

        async fn update_query_status(
            &self,
            id: i64,
            status: QueryStatus,
        ) -> Result<(), DomainError> {
            self.updates.lock().unwrap().push((id, status));
            Ok(())
        }

        async fn load_whitelist(&self, _vlan: VlanId) -> Result<HashSet<String>, DomainError> {
            Ok(HashSet::new())
        }

        async fn load_blocklist_sources(
            &self,
            _vlan: VlanId,
        ) -> Result<Vec<BlocklistSource>, DomainError> {
            Ok(Vec::new())
        }
    }

    fn event(domain: &str, ts: i64, status: QueryStatus) -> QueryEvent {
        QueryEvent {
            ts_second: ts,
            client_ip: "192.168.10.5".to_string(),
            domain: domain.to_string(),
            query_type: "A".to_string(),
            status,
            vlan_id: 10,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_allowed_then_blocked_stores_single_blocked_row() {
        let store = RecordingStore::default();
        let mut buffer = DedupBuffer::new();

        buffer
            .offer(event("ads.example.com", 1_700_000_000, QueryStatus::Allowed), &store)
            .await;
        buffer
            .offer(event("ads.example.com", 1_700_000_000, QueryStatus::Blocked), &store)
            .await;

        tokio::time::advance(Duration::from_secs(6)).await;
        let outcome = buffer.flush_due(&store).await;

        assert_eq!(outcome.flushed, 1);
        let inserts = store.inserts.lock().unwrap();
        assert_eq!(inserts.len(), 1);
        assert_eq!(inserts[0].status, QueryStatus::Blocked);
        assert!(store.updates.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_young_events_are_not_flushed() {
        let store = RecordingStore::default();
        let mut buffer = DedupBuffer::new();

        buffer
            .offer(event("a.example.com", 1, QueryStatus::Allowed), &store)
            .await;
        tokio::time::advance(Duration::from_secs(4)).await;
        let outcome = buffer.flush_due(&store).await;

        assert_eq!(outcome.flushed, 0);
        assert_eq!(buffer.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_due_events_flush_in_fifo_order() {
        let store = RecordingStore::default();
        let mut buffer = DedupBuffer::new();

        for i in 0..3 {
            buffer
                .offer(event(&format!("host{i}.example.com"), i, QueryStatus::Allowed), &store)
                .await;
            tokio::time::advance(Duration::from_secs(1)).await;
        }
        tokio::time::advance(Duration::from_secs(5)).await;
        buffer.flush_due(&store).await;

        let inserts = store.inserts.lock().unwrap();
        let domains: Vec<&str> = inserts.iter().map(|e| e.domain.as_str()).collect();
        assert_eq!(
            domains,
            vec!["host0.example.com", "host1.example.com", "host2.example.com"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_capacity_overflow_drains_before_append() {
        let store = RecordingStore::default();
        let mut buffer = DedupBuffer::new();

        for i in 0..30 {
            buffer
                .offer(event(&format!("host{i}.example.com"), i, QueryStatus::Allowed), &store)
                .await;
            assert!(buffer.len() <= DEDUP_CAPACITY);
        }

        // The 26th offer drained the first 25; the remainder are pending.
        assert_eq!(buffer.len(), 5);
        assert_eq!(store.inserts.lock().unwrap().len(), 25);
    }

    #[tokio::test(start_paused = true)]
    async fn test_blocked_after_flush_creates_new_pending() {
        let store = RecordingStore::default();
        let mut buffer = DedupBuffer::with_limits(DEDUP_WINDOW, 1);

        buffer
            .offer(event("ads.example.com", 7, QueryStatus::Allowed), &store)
            .await;
        // Overflow drains the allowed event out of the buffer entirely.
        buffer
            .offer(event("other.example.com", 8, QueryStatus::Allowed), &store)
            .await;
        assert_eq!(store.inserts.lock().unwrap().len(), 1);

        // A blocked line for the already-flushed key no longer has a
        // pending partner; it becomes a fresh pending event (after the
        // overflow drain pushes out the other entry).
        buffer
            .offer(event("ads.example.com", 7, QueryStatus::Blocked), &store)
            .await;
        assert!(store.updates.lock().unwrap().is_empty());
        assert_eq!(store.inserts.lock().unwrap().len(), 2);
        assert_eq!(buffer.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_insert_failure_drops_event_and_counts_error() {
        let store = RecordingStore::default();
        store.fail_inserts.store(true, Ordering::SeqCst);
        let mut buffer = DedupBuffer::new();

        buffer
            .offer(event("a.example.com", 1, QueryStatus::Allowed), &store)
            .await;
        tokio::time::advance(Duration::from_secs(6)).await;
        let outcome = buffer.flush_due(&store).await;

        assert_eq!(outcome.errors, 1);
        assert_eq!(outcome.flushed, 0);
        assert!(buffer.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicate_allowed_coalesces() {
        let store = RecordingStore::default();
        let mut buffer = DedupBuffer::new();

        buffer
            .offer(event("a.example.com", 1, QueryStatus::Allowed), &store)
            .await;
        buffer
            .offer(event("a.example.com", 1, QueryStatus::Allowed), &store)
            .await;

        assert_eq!(buffer.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drain_ignores_window() {
        let store = RecordingStore::default();
        let mut buffer = DedupBuffer::new();

        buffer
            .offer(event("a.example.com", 1, QueryStatus::Allowed), &store)
            .await;
        let outcome = buffer.drain(&store).await;

        assert_eq!(outcome.flushed, 1);
        assert!(buffer.is_empty());
    }
}
