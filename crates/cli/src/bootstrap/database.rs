use std::sync::Arc;
use tracing::info;
use warden_application::ports::QueryStore;
use warden_domain::Config;
use warden_infrastructure::database::create_pool;
use warden_infrastructure::repositories::SqliteQueryStore;

pub async fn init_store(config: &Config) -> anyhow::Result<Arc<SqliteQueryStore>> {
    let pool = create_pool(&config.database).await?;
    let store = Arc::new(SqliteQueryStore::new(pool));
    store.ensure_schema().await?;

    info!(
        database = %config.database.database_path().display(),
        "Store ready"
    );
    Ok(store)
}
