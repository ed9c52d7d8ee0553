//! Rent draft state machine.
//!
//! A draft lives only in the client session. Its variant is its state:
//!
//! ```text
//! Empty ──► DatesSet ──► ItemChosen ──► ContactSubmitted ──► Committed
//!              ▲  │          ▲  │            │
//!              └──┘          └──┘            └── choose_model keeps contact
//! ```
//!
//! `submit_dates` restarts from any state. A committed draft only waits to be
//! shown once and then removed.

use common::{DateRange, ModelId, RentId};
use rent_store::{NewRent, VehicleModel};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The model picked for a draft, with its display name denormalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChosenModel {
    pub id: ModelId,
    pub name: String,
}

impl From<VehicleModel> for ChosenModel {
    fn from(model: VehicleModel) -> Self {
        Self {
            id: model.id,
            name: model.name,
        }
    }
}

/// Contact fields entered on the rent form.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContactDetails {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
}

/// Name of the state a draft is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DraftStage {
    Empty,
    DatesSet,
    ItemChosen,
    ContactSubmitted,
    Committed,
}

impl DraftStage {
    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            DraftStage::Empty => "Empty",
            DraftStage::DatesSet => "DatesSet",
            DraftStage::ItemChosen => "ItemChosen",
            DraftStage::ContactSubmitted => "ContactSubmitted",
            DraftStage::Committed => "Committed",
        }
    }
}

impl std::fmt::Display for DraftStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Raised when a step is invoked on a draft that is not ready for it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DraftError {
    #[error("Cannot {action} a draft in {stage} state")]
    OutOfOrder {
        action: &'static str,
        stage: DraftStage,
    },
}

/// An in-flight rent, carried across requests in the session.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RentDraft {
    /// Nothing stored for this client.
    #[default]
    Empty,

    DatesSet {
        dates: DateRange,
    },

    ItemChosen {
        dates: DateRange,
        model: ChosenModel,
    },

    /// Contact fields merged in; validation pending or failed.
    ContactSubmitted {
        dates: DateRange,
        model: ChosenModel,
        contact: ContactDetails,
    },

    /// Written to the store; waiting for the summary to be shown once.
    Committed {
        dates: DateRange,
        model: ChosenModel,
        contact: ContactDetails,
        rent_id: RentId,
    },
}

impl RentDraft {
    /// Starts a fresh draft for a date range, discarding anything before it.
    pub fn submit_dates(dates: DateRange) -> Self {
        RentDraft::DatesSet { dates }
    }

    /// Starts a draft with the model already picked (model page entry).
    pub fn for_model(dates: DateRange, model: ChosenModel) -> Self {
        RentDraft::ItemChosen { dates, model }
    }

    pub fn stage(&self) -> DraftStage {
        match self {
            RentDraft::Empty => DraftStage::Empty,
            RentDraft::DatesSet { .. } => DraftStage::DatesSet,
            RentDraft::ItemChosen { .. } => DraftStage::ItemChosen,
            RentDraft::ContactSubmitted { .. } => DraftStage::ContactSubmitted,
            RentDraft::Committed { .. } => DraftStage::Committed,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, RentDraft::Empty)
    }

    /// Picks (or re-picks) the model. Contact fields already entered survive.
    pub fn choose_model(self, model: ChosenModel) -> Result<Self, DraftError> {
        match self {
            RentDraft::DatesSet { dates } | RentDraft::ItemChosen { dates, .. } => {
                Ok(RentDraft::ItemChosen { dates, model })
            }
            RentDraft::ContactSubmitted { dates, contact, .. } => {
                Ok(RentDraft::ContactSubmitted {
                    dates,
                    model,
                    contact,
                })
            }
            other => Err(other.out_of_order("choose a model for")),
        }
    }

    /// Merges contact fields into a draft that has a model.
    pub fn submit_contact(self, contact: ContactDetails) -> Result<Self, DraftError> {
        match self {
            RentDraft::ItemChosen { dates, model }
            | RentDraft::ContactSubmitted { dates, model, .. } => {
                Ok(RentDraft::ContactSubmitted {
                    dates,
                    model,
                    contact,
                })
            }
            other => Err(other.out_of_order("submit contact details for")),
        }
    }

    /// Marks the draft as written to the store under `rent_id`.
    pub fn commit(self, rent_id: RentId) -> Result<Self, DraftError> {
        match self {
            RentDraft::ContactSubmitted {
                dates,
                model,
                contact,
            } => Ok(RentDraft::Committed {
                dates,
                model,
                contact,
                rent_id,
            }),
            other => Err(other.out_of_order("commit")),
        }
    }

    /// Builds the row to insert from a draft with contact details.
    pub fn to_new_rent(&self) -> Result<NewRent, DraftError> {
        match self {
            RentDraft::ContactSubmitted {
                dates,
                model,
                contact,
            } => Ok(NewRent {
                first_name: contact.first_name.clone(),
                last_name: contact.last_name.clone(),
                email: contact.email.clone(),
                phone: contact.phone.clone(),
                dates: *dates,
                model_id: model.id,
            }),
            other => Err(other.out_of_order("build a rent from")),
        }
    }

    pub fn dates(&self) -> Option<DateRange> {
        match self {
            RentDraft::Empty => None,
            RentDraft::DatesSet { dates }
            | RentDraft::ItemChosen { dates, .. }
            | RentDraft::ContactSubmitted { dates, .. }
            | RentDraft::Committed { dates, .. } => Some(*dates),
        }
    }

    pub fn model(&self) -> Option<&ChosenModel> {
        match self {
            RentDraft::Empty | RentDraft::DatesSet { .. } => None,
            RentDraft::ItemChosen { model, .. }
            | RentDraft::ContactSubmitted { model, .. }
            | RentDraft::Committed { model, .. } => Some(model),
        }
    }

    pub fn contact(&self) -> Option<&ContactDetails> {
        match self {
            RentDraft::ContactSubmitted { contact, .. } | RentDraft::Committed { contact, .. } => {
                Some(contact)
            }
            _ => None,
        }
    }

    pub fn rent_id(&self) -> Option<RentId> {
        match self {
            RentDraft::Committed { rent_id, .. } => Some(*rent_id),
            _ => None,
        }
    }

    fn out_of_order(&self, action: &'static str) -> DraftError {
        DraftError::OutOfOrder {
            action,
            stage: self.stage(),
        }
    }
}
