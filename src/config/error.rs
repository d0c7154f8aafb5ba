/// Error types for configuration module
use thiserror::Error;

/// Configuration error type
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to build or deserialize the layered configuration
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// Explicitly requested configuration file does not exist
    #[error("Configuration file not found at: {0}")]
    FileNotFound(String),

    /// Values that deserialize but cannot work
    #[error("Invalid configuration: {0}")]
    InvalidStructure(String),

    /// Log directory or subscriber setup failed
    #[error("Failed to initialise logging: {0}")]
    Logging(String),
}
