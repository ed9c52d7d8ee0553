//! Domain layer for the rent booking system.
//!
//! This crate provides:
//! - the availability engine answering "what is free between these dates"
//! - the rent draft state machine carried in the client session
//! - validation of the contact form that finalizes a draft

pub mod availability;
pub mod draft;
pub mod error;
pub mod forms;

pub use availability::AvailabilityService;
pub use draft::{ChosenModel, ContactDetails, DraftError, DraftStage, RentDraft};
pub use error::DomainError;
pub use forms::{Form, FormErrors, validate_contact};
