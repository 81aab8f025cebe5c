//! Document store errors.

use thiserror::Error;

/// Errors raised by a [`DocumentStore`](super::DocumentStore).
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store cannot be reached.
    #[error("document store unavailable: {0}")]
    Unavailable(String),

    /// An update with `MustExist` targeted a missing document.
    #[error("document {collection}/{key} does not exist")]
    DocumentNotFound { collection: String, key: String },

    /// A write would give two documents the same value on a unique index.
    #[error("unique index {collection}.{field} already holds {value}")]
    UniqueViolation {
        collection: String,
        field: String,
        value: String,
    },

    /// A keyed append found a different element with the same key.
    #[error("array `{field}` already holds a different element with {key_field} = {key}")]
    KeyedElementConflict {
        field: String,
        key_field: String,
        key: String,
    },

    /// A field (or array element) has the wrong JSON type for the update.
    #[error("field `{field}` is not {expected}")]
    FieldType {
        field: String,
        expected: &'static str,
    },

    /// Reading or writing a snapshot file failed.
    #[error("snapshot I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// A snapshot file could not be encoded or decoded.
    #[error("snapshot encoding failed: {0}")]
    Serialization(#[from] serde_json::Error),
}
