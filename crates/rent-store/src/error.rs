use std::time::Duration;

use thiserror::Error;

use crate::{DateRange, ModelId};

/// Errors that can occur when talking to the rent store.
#[derive(Debug, Error)]
pub enum RentStoreError {
    /// No vehicle model with this id exists.
    #[error("Model not found: {0}")]
    ModelNotFound(ModelId),

    /// The model already has a restriction overlapping the requested dates.
    /// Only raised by the transactional commit path.
    #[error("Model {model_id} is not available from {dates}")]
    Conflict { model_id: ModelId, dates: DateRange },

    /// A query did not finish within the configured timeout.
    #[error("Query timed out after {0:?}")]
    Timeout(Duration),

    /// The backend refused the operation.
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    /// A stored row violates an invariant of the domain types.
    #[error("Corrupt row: {0}")]
    CorruptRow(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl RentStoreError {
    /// True when the failure comes from the data source itself rather than
    /// from the data it returned.
    pub fn is_backend_failure(&self) -> bool {
        matches!(
            self,
            RentStoreError::Timeout(_)
                | RentStoreError::Unavailable(_)
                | RentStoreError::Database(_)
                | RentStoreError::Migration(_)
                | RentStoreError::CorruptRow(_)
        )
    }
}

/// Result type for rent store operations.
pub type Result<T> = std::result::Result<T, RentStoreError>;
