//! Storage-specific error type wrapping sqlx errors.

use millbridge_domain::error::BridgeError;

/// Errors originating from the `SQLite` storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A query or connection failed.
    #[error("database error")]
    Database(#[from] sqlx::Error),

    /// Failed to encode or decode a stored JSON document.
    #[error("JSON document error for {key}")]
    Json {
        /// Document key.
        key: &'static str,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// Failed to run migrations.
    #[error("migration error")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl From<StorageError> for BridgeError {
    fn from(err: StorageError) -> Self {
        Self::Storage(Box::new(err))
    }
}
