//! Error types for the MongoDB storage backend.

use mongodb::error::ErrorKind;
use recipes_storage::StorageError;

/// Errors specific to the MongoDB storage backend.
#[derive(Debug, thiserror::Error)]
pub enum MongoError {
    /// Driver level failure (network, server, auth).
    #[error("MongoDB error: {0}")]
    Driver(#[from] mongodb::error::Error),

    /// A value could not be converted to BSON.
    #[error("BSON serialization error: {0}")]
    Serialization(#[from] mongodb::bson::ser::Error),

    /// A stored document could not be mapped to a domain value.
    #[error("Invalid document: {message}")]
    InvalidDocument { message: String },
}

impl MongoError {
    #[must_use]
    pub fn invalid_document(message: impl Into<String>) -> Self {
        Self::InvalidDocument {
            message: message.into(),
        }
    }

    /// Returns `true` when the server could not be reached at all.
    #[must_use]
    pub fn is_connectivity(&self) -> bool {
        match self {
            Self::Driver(e) => matches!(
                *e.kind,
                ErrorKind::ServerSelection { .. } | ErrorKind::Io(_)
            ),
            _ => false,
        }
    }
}

impl From<MongoError> for StorageError {
    fn from(err: MongoError) -> Self {
        if err.is_connectivity() {
            return StorageError::connection_error(err.to_string());
        }
        match err {
            MongoError::InvalidDocument { message } => StorageError::invalid_document(message),
            MongoError::Serialization(e) => StorageError::invalid_document(e.to_string()),
            other => StorageError::internal(other.to_string()),
        }
    }
}

/// Result type alias for MongoDB operations.
pub type Result<T> = std::result::Result<T, MongoError>;
