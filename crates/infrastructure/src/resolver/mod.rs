pub mod ingestor;
pub mod reload;
pub mod spawn;
pub mod supervisor;

pub use ingestor::Ingestor;
pub use reload::PidFileReload;
pub use spawn::{spawn_resolver, ResolverHandle};
pub use supervisor::{SlotState, Supervisor};
