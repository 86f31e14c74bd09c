//! Bridge error types

use std::path::PathBuf;

use rookwire_core::session::SessionError;
use rookwire_hal_std::StdUartError;

use crate::remote::BenchError;

/// Errors while loading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse TOML content
    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),

    /// Parsed, but unusable
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Errors that stop the bridge
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("serial port: {0}")]
    Serial(#[from] StdUartError),

    #[error("bench opponent: {0}")]
    Bench(#[from] BenchError),

    #[error("session ended: {0}")]
    Session(SessionError),
}
