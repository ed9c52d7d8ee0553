//! Date-range availability over the shared inventory.

use common::{DateRange, ModelId};
use rent_store::{RentRepository, RentRepositoryExt, VehicleModel};

use crate::error::DomainError;

/// Answers availability questions against a rent store.
///
/// Stateless apart from the store handle; safe to share between requests.
#[derive(Debug, Clone)]
pub struct AvailabilityService<R: RentRepository> {
    store: R,
}

impl<R: RentRepository> AvailabilityService<R> {
    /// Creates a new availability service over the given store.
    pub fn new(store: R) -> Self {
        Self { store }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &R {
        &self.store
    }

    /// Returns every model with no restriction overlapping `dates`.
    ///
    /// An empty vector means nothing is free; a failing store is an error,
    /// never an empty result.
    #[tracing::instrument(skip(self), fields(%dates))]
    pub async fn available_models(&self, dates: DateRange) -> Result<Vec<VehicleModel>, DomainError> {
        metrics::counter!("availability_queries_total", "kind" => "all").increment(1);

        let (models, blocked) = futures_util::try_join!(
            self.store.all_models(),
            self.store.overlapping_model_ids(dates),
        )?;

        let available: Vec<VehicleModel> = models
            .into_iter()
            .filter(|model| !blocked.contains(&model.id))
            .collect();

        tracing::debug!(
            available = available.len(),
            blocked = blocked.len(),
            "availability computed"
        );
        Ok(available)
    }

    /// Returns true when `model_id` has no restriction overlapping `dates`.
    #[tracing::instrument(skip(self), fields(%dates, %model_id))]
    pub async fn is_model_available(
        &self,
        dates: DateRange,
        model_id: ModelId,
    ) -> Result<bool, DomainError> {
        metrics::counter!("availability_queries_total", "kind" => "single").increment(1);
        Ok(self.store.is_model_available(dates, model_id).await?)
    }
}
