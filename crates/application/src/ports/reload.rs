use async_trait::async_trait;
use warden_domain::{DomainError, VlanId};

/// Reload fan-out toward running resolvers.
///
/// Implementations route a reload either through the supervisor's slot
/// registry (in-process) or through on-disk PID descriptors (standalone
/// commands). A targeted reload for a VLAN with no live ingestor falls
/// back to broadcasting.
#[async_trait]
pub trait ReloadPort: Send + Sync {
    /// Reload the resolver serving one VLAN.
    async fn request_reload(&self, vlan: VlanId) -> Result<(), DomainError>;

    /// Reload every running resolver.
    async fn reload_all(&self) -> Result<(), DomainError>;
}
