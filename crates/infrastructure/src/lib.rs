//! Warden Infrastructure Layer
//!
//! Everything that touches the outside world: the SQLite store, the
//! filesystem (config trees, include files, PID descriptors), the host
//! network, child resolver processes, and remote blocklists.
pub mod blocklist;
pub mod config_tree;
pub mod database;
pub mod hosts;
pub mod repositories;
pub mod resolver;
pub mod system;
