use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::{
    CommittedRent, DateRange, ModelId, NewRent, NewRentRestriction, RentId, RestrictionId, Result,
    VehicleModel,
};

/// Core trait for rent store implementations.
///
/// Every implementation must answer the overlap queries with the half-open
/// predicate `start < other.end && other.start < end`, and must fail
/// rather than block when the backing store does not answer in time.
#[async_trait]
pub trait RentRepository: Send + Sync {
    /// Returns the whole inventory ordered by id.
    async fn all_models(&self) -> Result<Vec<VehicleModel>>;

    /// Looks a model up by id.
    ///
    /// Fails with `ModelNotFound` if it does not exist.
    async fn model_by_id(&self, id: ModelId) -> Result<VehicleModel>;

    /// Returns true if at least one restriction for `model_id` overlaps `dates`.
    async fn overlap_exists(&self, dates: DateRange, model_id: ModelId) -> Result<bool>;

    /// Returns every model id with at least one restriction overlapping `dates`.
    async fn overlapping_model_ids(&self, dates: DateRange) -> Result<BTreeSet<ModelId>>;

    /// Inserts a rent and returns its generated id.
    async fn insert_rent(&self, rent: NewRent) -> Result<RentId>;

    /// Inserts a restriction row.
    async fn insert_rent_restriction(
        &self,
        restriction: NewRentRestriction,
    ) -> Result<RestrictionId>;

    /// Inserts a rent and its paired restriction as one unit.
    ///
    /// Overlap is re-checked under a per-model lock immediately before the
    /// insert; a conflicting restriction fails the whole commit with
    /// `Conflict` and leaves no rows behind.
    async fn commit_rent(&self, rent: NewRent) -> Result<CommittedRent>;
}

/// Extension trait providing convenience methods for rent stores.
#[async_trait]
pub trait RentRepositoryExt: RentRepository {
    /// Returns true when `model_id` has no overlapping restriction.
    async fn is_model_available(&self, dates: DateRange, model_id: ModelId) -> Result<bool> {
        Ok(!self.overlap_exists(dates, model_id).await?)
    }
}

// Blanket implementation for all RentRepository implementations
impl<T: RentRepository + ?Sized> RentRepositoryExt for T {}
