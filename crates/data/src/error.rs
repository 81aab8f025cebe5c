//! Errors returned by the user data source.

use thiserror::Error;

use crate::store::StoreError;

/// Error type shared by every [`UserDataSource`](crate::UserDataSource)
/// operation.
#[derive(Debug, Error)]
pub enum DataSourceError {
    /// The requested user does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The write would break a uniqueness rule (duplicate `userId`, or an
    /// address/cart id already used by a different entry).
    #[error("conflict: {0}")]
    Conflict(String),

    /// The document store could not be reached or failed.
    #[error("transport error: {0}")]
    Transport(#[source] StoreError),

    /// A stored document does not match the expected shape.
    #[error("data corruption: {0}")]
    DataCorruption(String),
}

impl DataSourceError {
    /// The canonical "no such user" error.
    #[must_use]
    pub fn user_not_found() -> Self {
        Self::NotFound("User Not Found".to_owned())
    }

    /// Whether this error is a `NotFound`.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<StoreError> for DataSourceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DocumentNotFound { .. } => Self::user_not_found(),
            StoreError::UniqueViolation { .. } | StoreError::KeyedElementConflict { .. } => {
                Self::Conflict(err.to_string())
            }
            StoreError::FieldType { .. } => Self::DataCorruption(err.to_string()),
            StoreError::Unavailable(_) | StoreError::Io(_) | StoreError::Serialization(_) => {
                Self::Transport(err)
            }
        }
    }
}

/// Result type alias for `DataSourceError`.
pub type Result<T> = std::result::Result<T, DataSourceError>;
