//! Error Types
//!
//! Every failure a compiled program can observe flows through [`ShimError`].
//! Operations whose failures are reported as absence return `Option`, and
//! operations whose failures are swallowed return `()`; only propagated
//! faults reach this type.

use std::fmt;

use thiserror::Error;

use crate::config::ConfigError;

/// A fatal condition raised deliberately by a compiled program.
///
/// The two parts are kept separate so callers never re-parse the rendered
/// `"{kind}: {message}"` payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RaisedError {
    /// Error type tag, e.g. `IOError`
    pub kind: String,
    /// Human-readable detail
    pub message: String,
}

impl RaisedError {
    /// Decode both parts from raw bytes.
    pub fn from_bytes(kind: &[u8], message: &[u8]) -> Self {
        Self {
            kind: String::from_utf8_lossy(kind).into_owned(),
            message: String::from_utf8_lossy(message).into_owned(),
        }
    }
}

impl fmt::Display for RaisedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for RaisedError {}

/// Errors propagated to the caller of a shim operation.
#[derive(Debug, Error)]
pub enum ShimError {
    #[error("{0}")]
    Raised(RaisedError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Range out of bounds: offset {offset} + length {length} > buffer length {len}")]
    OutOfBounds {
        offset: usize,
        length: usize,
        len: usize,
    },

    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot run an empty command")]
    EmptyCommand,

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ShimError {
    /// The raised payload, if this error came from [`raise`].
    pub fn as_raised(&self) -> Option<&RaisedError> {
        match self {
            ShimError::Raised(raised) => Some(raised),
            _ => None,
        }
    }
}

/// Result type for shim operations.
pub type ShimResult<T> = Result<T, ShimError>;

/// Raise a fatal condition carrying a type tag and a message.
///
/// Never returns `Ok`; the generic success type lets callers use it in any
/// position, e.g. `return raise(b"IOError", b"disk full");`.
pub fn raise<T>(kind: &[u8], message: &[u8]) -> ShimResult<T> {
    Err(ShimError::Raised(RaisedError::from_bytes(kind, message)))
}
