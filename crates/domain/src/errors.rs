use crate::config::ConfigError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Materialisation failed: {0}")]
    Materialisation(String),

    #[error("Resolver spawn failed: {0}")]
    Spawn(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Blocklist fetch failed: {0}")]
    Fetch(String),

    #[error("Signalling failed: {0}")]
    Signal(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for DomainError {
    fn from(e: std::io::Error) -> Self {
        DomainError::Io(e.to_string())
    }
}
