//! Error types for hashlib
//!
//! Provides a unified error type for all fallible operations.
//!
//! Missing or duplicate keys are not errors: `get`/`remove` return `Option`
//! and `put` returns `bool`.

use std::collections::TryReserveError;

use thiserror::Error;

/// Result type alias using HashlibError
pub type Result<T> = std::result::Result<T, HashlibError>;

/// Unified error type for hashlib operations
#[derive(Debug, Error)]
pub enum HashlibError {
    // -------------------------------------------------------------------------
    // Resource Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Allocation failed: {0}")]
    Allocation(#[from] TryReserveError),

    // -------------------------------------------------------------------------
    // Table Errors
    // -------------------------------------------------------------------------
    #[error("Invalid table capacity {0}: must be between 1 and 2^31")]
    InvalidCapacity(u64),

    // -------------------------------------------------------------------------
    // Persistence Errors
    // -------------------------------------------------------------------------
    #[error("Not a recognized hashlib file (magic {0:#x})")]
    BadMagic(u64),

    #[error("Truncated stream: {0}")]
    Truncated(String),

    #[error("Codec error: {0}")]
    Codec(String),

    #[error("Entry count mismatch: header says {expected}, stream holds {actual}")]
    CountMismatch { expected: u64, actual: u64 },
}

impl From<bincode::Error> for HashlibError {
    fn from(err: bincode::Error) -> Self {
        HashlibError::Codec(err.to_string())
    }
}
