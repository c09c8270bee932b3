use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use std::collections::HashSet;
use tracing::{debug, info, warn};
use warden_application::ports::QueryStore;
use warden_domain::{BlocklistSource, DomainError, QueryEvent, QueryStatus, VlanId};

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

/// Required shape of one table: columns that must exist, named indexes
/// that must exist, and columns that must form the primary key. Any
/// mismatch drops and recreates the table — `dns_queries` is a rolling
/// log and the list tables are managed by external tools, so losing rows
/// on a shape change is acceptable.
struct TableSpec {
    name: &'static str,
    create: &'static [&'static str],
    required_columns: &'static [&'static str],
    required_indexes: &'static [&'static str],
    required_pk: &'static [&'static str],
}

const TABLES: &[TableSpec] = &[
    TableSpec {
        name: "dns_queries",
        create: &[
            "CREATE TABLE dns_queries (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                ts DATETIME NOT NULL,
                client_ip VARCHAR(45),
                domain VARCHAR(255),
                query_type VARCHAR(20) DEFAULT 'unknown',
                status VARCHAR(20),
                vlan_id INTEGER NOT NULL DEFAULT 0
            )",
            "CREATE INDEX idx_ts ON dns_queries (ts)",
            "CREATE INDEX idx_domain ON dns_queries (domain)",
            "CREATE INDEX idx_client_ip ON dns_queries (client_ip)",
            "CREATE INDEX idx_vlan_id ON dns_queries (vlan_id)",
            "CREATE INDEX idx_ts_domain ON dns_queries (ts, domain)",
            "CREATE INDEX idx_ts_client ON dns_queries (ts, client_ip)",
            "CREATE INDEX idx_ts_vlan ON dns_queries (ts, vlan_id)",
        ],
        required_columns: &[
            "id",
            "ts",
            "client_ip",
            "domain",
            "query_type",
            "status",
            "vlan_id",
        ],
        required_indexes: &[
            "idx_ts",
            "idx_domain",
            "idx_client_ip",
            "idx_vlan_id",
            "idx_ts_domain",
            "idx_ts_client",
            "idx_ts_vlan",
        ],
        required_pk: &[],
    },
    TableSpec {
        name: "whitelist",
        create: &["CREATE TABLE whitelist (
                domain VARCHAR(255) NOT NULL,
                vlan_id INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (domain, vlan_id)
            )"],
        required_columns: &["domain", "vlan_id"],
        required_indexes: &[],
        required_pk: &["domain", "vlan_id"],
    },
    TableSpec {
        name: "blacklist",
        create: &["CREATE TABLE blacklist (
                domain VARCHAR(255) NOT NULL,
                vlan_id INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (domain, vlan_id)
            )"],
        required_columns: &["domain", "vlan_id"],
        required_indexes: &[],
        required_pk: &["domain", "vlan_id"],
    },
    TableSpec {
        name: "blocklists",
        create: &[
            "CREATE TABLE blocklists (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name VARCHAR(255) NOT NULL,
                url VARCHAR(2048) NOT NULL,
                vlan_id INTEGER NOT NULL DEFAULT 0,
                created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )",
            "CREATE UNIQUE INDEX idx_name_vlan ON blocklists (name, vlan_id)",
        ],
        required_columns: &["id", "name", "url", "vlan_id", "created_at", "updated_at"],
        required_indexes: &["idx_name_vlan"],
        required_pk: &[],
    },
];

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

pub struct SqliteQueryStore {
    pool: SqlitePool,
}

impl SqliteQueryStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn table_exists(&self, table: &str) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?")
            .bind(table)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    /// Column name → 1-based primary-key position (0 = not part of the PK).
    async fn columns(&self, table: &str) -> Result<Vec<(String, i64)>, sqlx::Error> {
        let rows = sqlx::query(&format!("PRAGMA table_info({table})"))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .iter()
            .map(|r| (r.get::<String, _>("name"), r.get::<i64, _>("pk")))
            .collect())
    }

    async fn index_names(&self, table: &str) -> Result<HashSet<String>, sqlx::Error> {
        let rows = sqlx::query(&format!("PRAGMA index_list({table})"))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(|r| r.get::<String, _>("name")).collect())
    }

    /// True when the existing table satisfies every requirement of `spec`.
    async fn shape_matches(&self, spec: &TableSpec) -> Result<bool, sqlx::Error> {
        let columns = self.columns(spec.name).await?;
        let names: HashSet<&str> = columns.iter().map(|(n, _)| n.as_str()).collect();
        if spec.required_columns.iter().any(|c| !names.contains(c)) {
            return Ok(false);
        }

        for pk_col in spec.required_pk {
            let in_pk = columns
                .iter()
                .any(|(name, pk)| name == pk_col && *pk > 0);
            if !in_pk {
                return Ok(false);
            }
        }

        let indexes = self.index_names(spec.name).await?;
        Ok(spec.required_indexes.iter().all(|i| indexes.contains(*i)))
    }

    async fn create_table(&self, spec: &TableSpec) -> Result<(), sqlx::Error> {
        for stmt in spec.create {
            sqlx::query(stmt).execute(&self.pool).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl QueryStore for SqliteQueryStore {
    async fn ensure_schema(&self) -> Result<(), DomainError> {
        for spec in TABLES {
            let exists = self
                .table_exists(spec.name)
                .await
                .map_err(|e| DomainError::Store(e.to_string()))?;

            if exists {
                let ok = self
                    .shape_matches(spec)
                    .await
                    .map_err(|e| DomainError::Store(e.to_string()))?;
                if ok {
                    debug!(table = spec.name, "Table has correct structure");
                    continue;
                }
                warn!(
                    table = spec.name,
                    "Table is missing required columns or indexes, recreating"
                );
                sqlx::query(&format!("DROP TABLE {}", spec.name))
                    .execute(&self.pool)
                    .await
                    .map_err(|e| DomainError::Store(e.to_string()))?;
            }

            self.create_table(spec)
                .await
                .map_err(|e| DomainError::Store(e.to_string()))?;
            info!(table = spec.name, "Table created");
        }
        Ok(())
    }

    async fn insert_query(&self, event: &QueryEvent) -> Result<i64, DomainError> {
        let result = sqlx::query(
            "INSERT INTO dns_queries (ts, client_ip, domain, query_type, status, vlan_id)
             VALUES (datetime(?1, 'unixepoch'), ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(event.ts_second)
        .bind(&event.client_ip)
        .bind(&event.domain)
        .bind(&event.query_type)
        .bind(event.status.as_str())
        .bind(event.vlan_id as i64)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::Store(e.to_string()))?;

        Ok(result.last_insert_rowid())
    }

    async fn update_query_status(&self, id: i64, status: QueryStatus) -> Result<(), DomainError> {
        sqlx::query("UPDATE dns_queries SET status = ?1 WHERE id = ?2")
            .bind(status.as_str())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::Store(e.to_string()))?;
        Ok(())
    }

    async fn load_whitelist(&self, vlan: VlanId) -> Result<HashSet<String>, DomainError> {
        let rows = sqlx::query("SELECT domain FROM whitelist WHERE vlan_id IN (0, ?1)")
            .bind(vlan.0 as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::Store(e.to_string()))?;

        Ok(rows.iter().map(|r| r.get::<String, _>("domain")).collect())
    }

    async fn load_blocklist_sources(
        &self,
        vlan: VlanId,
    ) -> Result<Vec<BlocklistSource>, DomainError> {
        let rows = sqlx::query(
            "SELECT id, name, url, vlan_id FROM blocklists WHERE vlan_id = ?1 ORDER BY id",
        )
        .bind(vlan.0 as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::Store(e.to_string()))?;

        Ok(rows
            .iter()
            .map(|r| BlocklistSource {
                id: r.get("id"),
                name: r.get("name"),
                url: r.get("url"),
                vlan_id: r.get::<i64, _>("vlan_id") as u32,
            })
            .collect())
    }
}
