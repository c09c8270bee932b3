//! Configuration for unbound-warden, organised by concern:
//! - `root`: top-level `Config` and file loading
//! - `paths`: base/template/VLAN enumeration paths
//! - `database`: store location and pool tuning
//! - `resolver`: resolver binary, service account, timing budgets
//! - `hosts`: mesh-VPN hosts sync
//! - `blocklists`: blocklist fetching
//! - `logging`: log level
//! - `errors`: configuration errors

pub mod blocklists;
pub mod database;
pub mod errors;
pub mod hosts;
pub mod logging;
pub mod paths;
pub mod resolver;
pub mod root;

pub use blocklists::BlocklistConfig;
pub use database::DatabaseConfig;
pub use errors::ConfigError;
pub use hosts::HostsConfig;
pub use logging::LoggingConfig;
pub use paths::PathsConfig;
pub use resolver::ResolverConfig;
pub use root::Config;
