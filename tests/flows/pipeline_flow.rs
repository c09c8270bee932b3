//! Log line → parser → dedup buffer → SQLite, without a resolver
//! process in the loop.

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::Row;
use std::time::Duration;
use warden_application::ports::QueryStore;
use warden_application::{log_parser, DedupBuffer, DEDUP_CAPACITY};
use warden_domain::{QueryStatus, VlanId};
use warden_infrastructure::repositories::SqliteQueryStore;

async fn memory_store() -> (SqliteQueryStore, sqlx::SqlitePool) {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    let store = SqliteQueryStore::new(pool.clone());
    store.ensure_schema().await.unwrap();
    (store, pool)
}

#[tokio::test(start_paused = true)]
async fn test_allowed_then_blocked_within_window() {
    let (store, pool) = memory_store().await;
    let mut buffer = DedupBuffer::new();
    let vlan = VlanId(10);
    let now = 1_700_000_000;

    let allowed = log_parser::parse(
        "[1700000000] rx[1:1] info: 192.168.10.5 ads.example.com. A IN",
        now,
        vlan,
    )
    .unwrap();
    let blocked = log_parser::parse(
        "[1700000000] rx[1:1] debug: using localzone ads.example.com. always_null",
        now,
        vlan,
    )
    .unwrap();

    buffer.offer(allowed, &store).await;
    buffer.offer(blocked, &store).await;

    tokio::time::advance(Duration::from_secs(6)).await;
    let outcome = buffer.flush_due(&store).await;
    assert_eq!(outcome.flushed, 1);
    assert_eq!(outcome.errors, 0);

    let rows = sqlx::query(
        "SELECT ts, client_ip, domain, status, vlan_id FROM dns_queries",
    )
    .fetch_all(&pool)
    .await
    .unwrap();
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row.get::<String, _>("ts"), "2023-11-14 22:13:20");
    assert_eq!(row.get::<String, _>("client_ip"), "192.168.10.5");
    assert_eq!(row.get::<String, _>("domain"), "ads.example.com");
    assert_eq!(row.get::<String, _>("status"), "blocked");
    assert_eq!(row.get::<i64, _>("vlan_id"), 10);
}

#[tokio::test(start_paused = true)]
async fn test_burst_respects_capacity_bound() {
    let (store, pool) = memory_store().await;
    let mut buffer = DedupBuffer::new();
    let vlan = VlanId(0);

    for i in 0..30 {
        let line = format!(
            "[17000000{:02}] rx[1:1] info: 10.0.0.4 host{}.example.com. A IN",
            i, i
        );
        let event = log_parser::parse(&line, 1_700_000_000, vlan).unwrap();
        assert_eq!(event.status, QueryStatus::Allowed);
        buffer.offer(event, &store).await;
        assert!(buffer.len() <= DEDUP_CAPACITY);
    }

    // 25 flushed by the overflow drain, 5 still pending.
    let row = sqlx::query("SELECT COUNT(*) AS n FROM dns_queries")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(row.get::<i64, _>("n"), 25);
    assert_eq!(buffer.len(), 5);

    let outcome = buffer.drain(&store).await;
    assert_eq!(outcome.flushed, 5);
}
