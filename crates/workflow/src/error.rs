//! Workflow error types.

use common::{DateRange, ModelId};
use domain::{DomainError, DraftError, DraftStage};
use rent_store::RentStoreError;
use thiserror::Error;

use crate::session::SessionError;

/// The write that failed while committing a rent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitStage {
    /// Inserting the rent row.
    Rent,
    /// Inserting the restriction after the rent row was written.
    Restriction,
    /// The single-transaction commit.
    Transaction,
}

impl CommitStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommitStage::Rent => "rent",
            CommitStage::Restriction => "restriction",
            CommitStage::Transaction => "transaction",
        }
    }
}

impl std::fmt::Display for CommitStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors surfaced by workflow steps.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Dates or ids could not be parsed, or the date range is empty.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The session holds no draft, or one not ready for this step.
    #[error("No usable rent draft in session (found {stage})")]
    DraftMissing { stage: DraftStage },

    /// The requested model does not exist.
    #[error("Model not found: {0}")]
    ItemNotFound(ModelId),

    /// Every model is booked for the requested dates.
    #[error("No available vehicles from {0}")]
    NoAvailability(DateRange),

    /// The rent store failed while answering a query.
    #[error("Rent store failure: {0}")]
    BackendUnavailable(#[source] RentStoreError),

    /// Writing the rent failed.
    #[error("Commit failed at {stage} stage: {source}")]
    CommitFailed {
        stage: CommitStage,
        #[source]
        source: RentStoreError,
    },

    /// The session store failed.
    #[error("Session error: {0}")]
    Session(#[from] SessionError),
}

impl WorkflowError {
    /// True for failures of the store or the session backend.
    pub fn is_backend_failure(&self) -> bool {
        matches!(
            self,
            WorkflowError::BackendUnavailable(_)
                | WorkflowError::CommitFailed { .. }
                | WorkflowError::Session(_)
        )
    }
}

impl From<RentStoreError> for WorkflowError {
    fn from(err: RentStoreError) -> Self {
        match err {
            RentStoreError::ModelNotFound(id) => WorkflowError::ItemNotFound(id),
            other => WorkflowError::BackendUnavailable(other),
        }
    }
}

impl From<DraftError> for WorkflowError {
    fn from(err: DraftError) -> Self {
        match err {
            DraftError::OutOfOrder { stage, .. } => WorkflowError::DraftMissing { stage },
        }
    }
}

impl From<DomainError> for WorkflowError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Store(e) => e.into(),
            DomainError::Draft(e) => e.into(),
        }
    }
}

/// Convenience type alias for workflow results.
pub type Result<T> = std::result::Result<T, WorkflowError>;
