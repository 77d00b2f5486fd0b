//! Error types for the battmon library.

use thiserror::Error;

/// The main error type for battmon operations.
#[derive(Debug, Error)]
pub enum Error {
    /// No visible serial port looked like the device.
    #[error("no serial device matched any of: {}", keywords.join(", "))]
    NotFound { keywords: Vec<String> },

    /// The serial port could not be opened.
    #[error("cannot open {port}: {reason}")]
    Connection { port: String, reason: String },

    /// Serial port error.
    #[error("serial port error: {0}")]
    Serial(#[from] tokio_serial::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Connection is not established.
    #[error("not connected")]
    NotConnected,
}

/// Result type alias for battmon operations.
pub type Result<T> = std::result::Result<T, Error>;
