use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read config file {path}: {message}")]
    Read { path: String, message: String },

    #[error("Cannot parse config file {path}: {message}")]
    Parse { path: String, message: String },

    #[error("Network config: {0}")]
    Network(String),

    #[error("Missing required key: {0}")]
    MissingKey(String),

    #[error("Invalid value for {key}: {message}")]
    Invalid { key: String, message: String },
}
