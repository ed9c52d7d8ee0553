//! Rows owned by the rent store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{DateRange, ModelId, RentId, RestrictionId};

/// A rentable vehicle model. Read-only reference data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleModel {
    pub id: ModelId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Why a date range is blocked for a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum RestrictionKind {
    /// Blocked by a customer rent.
    #[default]
    Rent,
}

impl RestrictionKind {
    /// Key of the matching row in the `restrictions` table.
    pub fn id(&self) -> i64 {
        match self {
            RestrictionKind::Rent => 1,
        }
    }

    pub fn from_id(id: i64) -> Option<Self> {
        match id {
            1 => Some(RestrictionKind::Rent),
            _ => None,
        }
    }
}

/// A finalized rent about to be inserted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRent {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub dates: DateRange,
    pub model_id: ModelId,
}

/// A persisted rent. Immutable once inserted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rent {
    pub id: RentId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub dates: DateRange,
    pub model_id: ModelId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A restriction about to be inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRentRestriction {
    pub dates: DateRange,
    pub model_id: ModelId,
    pub rent_id: Option<RentId>,
    pub kind: RestrictionKind,
}

impl NewRentRestriction {
    /// The restriction that pairs with a committed rent: same dates, same model.
    pub fn for_rent(rent_id: RentId, rent: &NewRent) -> Self {
        Self {
            dates: rent.dates,
            model_id: rent.model_id,
            rent_id: Some(rent_id),
            kind: RestrictionKind::Rent,
        }
    }
}

/// A persisted "this model is unavailable on these dates" fact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RentRestriction {
    pub id: RestrictionId,
    pub dates: DateRange,
    pub model_id: ModelId,
    pub rent_id: Option<RentId>,
    pub kind: RestrictionKind,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Ids produced by a transactional commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommittedRent {
    pub rent_id: RentId,
    pub restriction_id: RestrictionId,
}
