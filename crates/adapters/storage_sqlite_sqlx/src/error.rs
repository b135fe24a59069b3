//! Storage-specific error type wrapping sqlx errors.

use voicehub_domain::error::{ConfigurationError, VoiceHubError};

/// Errors originating from the `SQLite` storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A query or connection failed.
    #[error("database error")]
    Database(#[from] sqlx::Error),

    /// Failed to (de)serialize a stored JSON value.
    #[error("JSON serialization error")]
    Json(#[from] serde_json::Error),

    /// Failed to run migrations.
    #[error("migration error")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A registry version does not fit the `INTEGER` column.
    #[error("registry version out of range")]
    Version(#[from] std::num::TryFromIntError),

    /// Stored rows no longer form a valid registry.
    #[error("stored registry is inconsistent")]
    Inconsistent(#[from] ConfigurationError),
}

impl From<StorageError> for VoiceHubError {
    fn from(err: StorageError) -> Self {
        Self::Storage(Box::new(err))
    }
}
