use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use std::str::FromStr;
use std::time::Duration;
use warden_domain::config::DatabaseConfig;
use warden_domain::DomainError;

/// Create the shared write pool for the query log and list tables.
///
/// The database file is created on first connect. SQLite WAL serialises
/// writers at the file level, so the pool stays small; a long busy
/// timeout rides out write bursts from several ingestors at once.
pub async fn create_pool(cfg: &DatabaseConfig) -> Result<SqlitePool, DomainError> {
    if let Some(parent) = cfg.database_path().parent() {
        std::fs::create_dir_all(parent)?;
    }

    let options = SqliteConnectOptions::from_str(&cfg.database_url())
        .map_err(|e| DomainError::Store(e.to_string()))?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(Duration::from_secs(cfg.write_busy_timeout_secs));

    let pool = SqlitePoolOptions::new()
        .max_connections(cfg.write_pool_max_connections)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(cfg.write_busy_timeout_secs))
        .connect_with(options)
        .await
        .map_err(|e| DomainError::Store(e.to_string()))?;

    sqlx::query("PRAGMA temp_store = MEMORY")
        .execute(&pool)
        .await
        .map_err(|e| DomainError::Store(e.to_string()))?;

    Ok(pool)
}
