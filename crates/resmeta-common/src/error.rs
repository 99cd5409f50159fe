//! Error types for resmeta
//!
//! This module defines the error type for configuration and process-level
//! failures. Engine errors live next to the engine in their own crates.

use thiserror::Error;

/// Common result type for resmeta operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for resmeta
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("deserialization error: {0}")]
    Deserialization(String),
}

impl Error {
    /// Create a new configuration error
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Check if this error was caused by invalid user input
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::Deserialization(_))
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Self::Deserialization(e.to_string())
    }
}
