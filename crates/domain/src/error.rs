//! Domain error types.

use rent_store::RentStoreError;
use thiserror::Error;

use crate::draft::DraftError;

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An error occurred in the rent store.
    #[error("Rent store error: {0}")]
    Store(#[from] RentStoreError),

    /// A draft transition was attempted out of order.
    #[error("Draft error: {0}")]
    Draft(#[from] DraftError),
}
