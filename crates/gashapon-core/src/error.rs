//! Error types for gashapon-core

use thiserror::Error;

/// Core error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("RON parse error: {0}")]
    Ron(#[from] ron::error::SpannedError),

    #[error("Duplicate definition: {0}")]
    DuplicateDefinition(String),

    #[error("Unknown grade: {0}")]
    UnknownGrade(String),

    #[error("Unknown character: {0}")]
    UnknownCharacter(String),

    #[error("Invalid content: {0}")]
    InvalidContent(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
