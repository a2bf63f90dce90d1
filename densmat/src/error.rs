//! Error types for reading density-matrix files

use densmat_core::DecodeError;
use thiserror::Error;

/// Result type for densmat operations
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// I/O error while opening or reading a source
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The byte stream did not decode into a valid matrix
    #[error("decode error: {0}")]
    Decode(DecodeError),

    /// A transport failed to open a location
    #[error("{transport} transport failed: {reason}")]
    Transport {
        transport: &'static str,
        reason: String,
    },

    /// Every configured transport failed
    #[error("no transport could open {0}")]
    NoTransport(String),

    /// JSON serialization error
    #[cfg(feature = "serde")]
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<DecodeError> for Error {
    fn from(err: DecodeError) -> Self {
        Error::Decode(err)
    }
}

impl Error {
    /// The decode error behind this error, if any
    pub fn decode_error(&self) -> Option<DecodeError> {
        match self {
            Error::Decode(err) => Some(*err),
            _ => None,
        }
    }
}
