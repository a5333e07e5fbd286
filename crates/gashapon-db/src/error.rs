//! Error types for store operations.

use thiserror::Error;

/// Errors that can occur while reading or writing the entity store.
///
/// Nothing here is ever swallowed: a failed write surfaces to the caller
/// instead of masquerading as "value absent".
#[derive(Debug, Error)]
pub enum Error {
    /// Native DB error.
    #[error("Database error: {0}")]
    Database(String),

    /// Record failed to serialize.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Stored bytes no longer decode as the expected record shape.
    #[error("Corrupt record at key '{key}'")]
    Corrupt { key: String },

    /// Compare-and-swap write lost the race for this key.
    #[error("Version conflict at key '{key}': expected {expected}, found {found}")]
    VersionConflict {
        key: String,
        expected: u64,
        found: u64,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, Error>;
