//! Rent workflow orchestration.
//!
//! A rent is assembled across several independent requests:
//! 1. submit a date range and get the free models
//! 2. choose a model
//! 3. submit contact details, which commits the rent
//! 4. view the summary exactly once
//!
//! The in-progress [`RentDraft`](domain::RentDraft) travels between those
//! requests in the client's session, behind the [`SessionStore`] trait.

pub mod error;
pub mod session;
pub mod workflow;

pub use error::{CommitStage, WorkflowError};
pub use session::{
    DEFAULT_SESSION_LIFETIME, InMemorySessionStore, MAX_SESSION_LIFETIME, SessionError, SessionId,
    SessionStore, SessionStoreExt,
};
pub use workflow::{CommitPolicy, ContactOutcome, DRAFT_KEY, RentWorkflow, parse_model_id};
