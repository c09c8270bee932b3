pub mod apparmor;
pub mod interfaces;
pub mod net_config;
pub mod ownership;
pub mod process;

pub use net_config::NetConfig;
