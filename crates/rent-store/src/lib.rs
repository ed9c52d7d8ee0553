//! Persistence gateway for the rent booking system.
//!
//! [`RentRepository`] is implemented twice with the same observable
//! behavior: [`PostgresRentRepository`] for production and
//! [`InMemoryRentRepository`] as a deterministic double with failure
//! injection for tests.

pub mod error;
pub mod memory;
pub mod model;
pub mod postgres;
pub mod store;

pub use common::{DateRange, ModelId, RentId, RestrictionId};
pub use error::{RentStoreError, Result};
pub use memory::InMemoryRentRepository;
pub use model::{
    CommittedRent, NewRent, NewRentRestriction, Rent, RentRestriction, RestrictionKind,
    VehicleModel,
};
pub use postgres::{PostgresRentRepository, connect};
pub use store::{RentRepository, RentRepositoryExt};
