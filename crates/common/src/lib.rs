//! Shared types for the rent booking system.
//!
//! Identifiers are thin newtypes over the database keys so that a model id
//! can never be passed where a rent id is expected. [`DateRange`] carries
//! the half-open interval semantics every availability check relies on.

mod dates;
mod types;

pub use dates::{DATE_LAYOUT, DateRange, DateRangeError, format_date, parse_date};
pub use types::{ModelId, RentId, RestrictionId};
