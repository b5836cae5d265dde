//! Error types for Questsheet

use thiserror::Error;

/// Main error type for Questsheet operations
#[derive(Error, Debug)]
pub enum SheetError {
    /// Name is empty after sanitization
    #[error("Invalid name: {0:?} has no characters left after sanitization")]
    InvalidName(String),

    /// Folder string is not one of the known storage folders
    #[error("Invalid folder: {0}")]
    InvalidFolder(String),

    /// Path does not have the `folder/name_timestamp` shape
    #[error("Malformed path {path:?}: {reason}")]
    MalformedPath { path: String, reason: String },

    /// Image exceeds the configured size limit
    #[error("Image too large: {size} bytes (max {max})")]
    ImageTooLarge { size: usize, max: usize },

    /// Bytes are not a PNG, JPEG or WebP image
    #[error("Unsupported image: {0}")]
    UnsupportedImage(String),

    /// A confirmation is already stored under this key
    #[error("Key already exists: {0}")]
    KeyExists(String),

    /// Configuration file could not be read or parsed
    #[error("Config error: {0}")]
    Config(String),

    /// Database creation/opening error
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    /// Transaction error
    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    /// Table error
    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    /// Storage operation error
    #[error("Storage operation error: {0}")]
    StorageOp(#[from] redb::StorageError),

    /// Commit error
    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    /// Error during serialization/deserialization
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// General I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SheetError {
    pub(crate) fn malformed(path: &str, reason: impl Into<String>) -> Self {
        SheetError::MalformedPath {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type alias using SheetError
pub type SheetResult<T> = Result<T, SheetError>;
