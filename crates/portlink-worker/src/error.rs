//! Error types for the link worker.

use thiserror::Error;

/// Result type alias for worker operations.
pub type Result<T> = std::result::Result<T, LinkError>;

/// Errors that can occur while constructing or running a link.
///
/// Once the worker thread is running, connection failures are not errors
/// from the caller's perspective: the supervisor recovers from them and
/// reports them as [`Event::Disconnected`](portlink_core::Event) through
/// the inbound queue.
#[derive(Debug, Error)]
pub enum LinkError {
    /// The link configuration failed validation.
    #[error(transparent)]
    Config(#[from] portlink_core::Error),

    /// The serial device could not be opened.
    #[error("Failed to open {port}: {source}")]
    Open {
        /// Port name from the configuration.
        port: String,
        /// Underlying serial error.
        #[source]
        source: serialport::Error,
    },

    /// Low-level I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
