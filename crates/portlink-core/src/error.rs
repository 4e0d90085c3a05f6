//! Error types shared across the portlink crates.

use thiserror::Error;

/// Result type alias for portlink operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the core types.
#[derive(Debug, Error)]
pub enum Error {
    /// A link configuration failed validation.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Which constraint was violated.
        message: String,
    },
}

impl Error {
    /// Create a new configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}
