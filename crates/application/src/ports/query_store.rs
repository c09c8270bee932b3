use async_trait::async_trait;
use std::collections::HashSet;
use warden_domain::{BlocklistSource, DomainError, QueryEvent, QueryStatus, VlanId};

/// Shared relational store for query events and the externally managed
/// list tables.
///
/// Writes are per-statement auto-commit; no retry happens inside the
/// store. Each ingestor writes a disjoint `vlan_id` subset, so row-level
/// locking by primary key is all the isolation this needs.
#[async_trait]
pub trait QueryStore: Send + Sync {
    /// Create the database and every required table, dropping and
    /// recreating any table whose columns or indexes no longer match the
    /// required shape.
    async fn ensure_schema(&self) -> Result<(), DomainError>;

    /// Insert one finalised query event, returning its row id.
    async fn insert_query(&self, event: &QueryEvent) -> Result<i64, DomainError>;

    /// Upgrade the status of a previously inserted row.
    async fn update_query_status(&self, id: i64, status: QueryStatus) -> Result<(), DomainError>;

    /// Whitelist entries applicable to a VLAN: rows with `vlan_id` 0
    /// (wildcard) plus rows matching the VLAN itself. Entries are returned
    /// verbatim; callers normalise case and trailing dots.
    async fn load_whitelist(&self, vlan: VlanId) -> Result<HashSet<String>, DomainError>;

    /// Blocklist sources registered for exactly this VLAN. Unlike the
    /// whitelist there is no vlan-0 wildcard: vlan-0 sources serve only
    /// the default instance.
    async fn load_blocklist_sources(
        &self,
        vlan: VlanId,
    ) -> Result<Vec<BlocklistSource>, DomainError>;
}
