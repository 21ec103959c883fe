use std::time::Duration;
use thiserror::Error;

/// Main error type for the Warden supervisor
#[derive(Debug, Error)]
pub enum WardenError {
    // Process lifecycle errors
    #[error("Failed to spawn service: {0}")]
    Spawn(String),

    #[error("Failed to stop service: {0}")]
    Stop(String),

    #[error("Service did not exit within {0:?}")]
    StopTimeout(Duration),

    #[error("Signal error: {0}")]
    Signal(String),

    // Health prober errors
    #[error("Health prober error: {0}")]
    Probe(String),

    // Control listener errors
    #[error("Control error: {0}")]
    Control(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // IO errors (automatically converted from std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Warden operations
pub type Result<T> = std::result::Result<T, WardenError>;
