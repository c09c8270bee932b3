//! End-to-end ingestion: a fake resolver emits an answered line and its
//! localzone refusal for the same `(domain, second)`; exactly one row
//! must land in the store, with the final status `blocked`.

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::Row;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use warden_application::ports::QueryStore;
use warden_application::IngestStats;
use warden_infrastructure::repositories::SqliteQueryStore;
use warden_infrastructure::resolver::{spawn_resolver, Ingestor};
use warden_domain::config::ResolverConfig;
use warden_domain::VlanId;

fn fake_resolver(dir: &Path) -> ResolverConfig {
    let script = "#!/bin/sh\n\
        echo '[1700000000] rx[1:1] info: 192.168.10.5 ads.example.com. A IN'\n\
        echo '[1700000000] rx[1:1] debug: using localzone ads.example.com. always_null' >&2\n\
        sleep 1\n";
    let path = dir.join("fake-resolver");
    std::fs::write(&path, script).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    ResolverConfig {
        binary: path,
        spawn_grace_secs: 2,
        shutdown_grace_secs: 1,
        ..ResolverConfig::default()
    }
}

#[tokio::test]
async fn test_allowed_then_blocked_yields_one_blocked_row() {
    let dir = tempfile::tempdir().unwrap();
    let resolver_cfg = fake_resolver(dir.path());

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    let store: Arc<dyn QueryStore> = Arc::new(SqliteQueryStore::new(pool.clone()));
    store.ensure_schema().await.unwrap();

    let handle = spawn_resolver(&resolver_cfg, &dir.path().join("unbound.conf"))
        .await
        .unwrap();

    let stats = Arc::new(IngestStats::default());
    let (_reload_tx, reload_rx) = mpsc::channel(4);
    let ingestor = Ingestor::new(
        VlanId(10),
        handle,
        Arc::clone(&store),
        Arc::clone(&stats),
        reload_rx,
        CancellationToken::new(),
        Duration::from_secs(1),
    );

    // The fake resolver exits after a second; the ingestor then drains
    // its buffer and returns.
    tokio::time::timeout(Duration::from_secs(10), tokio::spawn(ingestor.run()))
        .await
        .expect("ingestor finished")
        .unwrap();

    let rows = sqlx::query("SELECT ts, client_ip, domain, query_type, status, vlan_id FROM dns_queries")
        .fetch_all(&pool)
        .await
        .unwrap();
    assert_eq!(rows.len(), 1, "allowed+blocked must coalesce into one row");

    let row = &rows[0];
    assert_eq!(row.get::<String, _>("ts"), "2023-11-14 22:13:20");
    assert_eq!(row.get::<String, _>("client_ip"), "192.168.10.5");
    assert_eq!(row.get::<String, _>("domain"), "ads.example.com");
    assert_eq!(row.get::<String, _>("query_type"), "A");
    assert_eq!(row.get::<String, _>("status"), "blocked");
    assert_eq!(row.get::<i64, _>("vlan_id"), 10);

    let snapshot = stats.snapshot();
    assert_eq!(snapshot.processed, 2);
    assert_eq!(snapshot.allowed, 1);
    assert_eq!(snapshot.blocked, 1);
    assert_eq!(snapshot.errors, 0);
    assert_eq!(snapshot.pending, 0);
}
