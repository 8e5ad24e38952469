//! Error types for Filebox.

use thiserror::Error;

/// Common error type for Filebox.
#[derive(Error, Debug)]
pub enum FileboxError {
    /// A required field was missing or malformed.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// No record for a public identifier, or no file for a private one.
    #[error("{0} not found")]
    NotFound(String),

    /// A generated identifier collided with an existing record.
    #[error("duplicate identifier: {0}")]
    DuplicateIdentifier(String),

    /// A storage path resolved outside the storage root.
    #[error("path violation: {0}")]
    PathViolation(String),

    /// A metadata row exists but its stored file does not.
    #[error("corrupted record: {0}")]
    CorruptedRecord(String),

    /// Database error.
    ///
    /// Errors from sqlx are converted automatically.
    #[error("database error: {0}")]
    Database(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl FileboxError {
    /// Returns true for [`FileboxError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, FileboxError::NotFound(_))
    }

    /// Returns true for [`FileboxError::CorruptedRecord`].
    pub fn is_corrupted(&self) -> bool {
        matches!(self, FileboxError::CorruptedRecord(_))
    }
}

impl From<sqlx::Error> for FileboxError {
    fn from(e: sqlx::Error) -> Self {
        FileboxError::Database(e.to_string())
    }
}

/// Result type alias for Filebox operations.
pub type Result<T> = std::result::Result<T, FileboxError>;
