use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::sync::RwLock;

use crate::{
    CommittedRent, DateRange, ModelId, NewRent, NewRentRestriction, Rent, RentId, RentRestriction,
    RentStoreError, RestrictionId, Result, VehicleModel, store::RentRepository,
};

/// Inventory every fresh store starts with, mirroring the seed migration.
pub const SEED_MODELS: [&str; 2] = ["Model 3", "Model Y"];

#[derive(Debug, Default)]
struct InMemoryState {
    models: BTreeMap<ModelId, VehicleModel>,
    rents: Vec<Rent>,
    restrictions: Vec<RentRestriction>,
    next_model_id: i64,
    next_rent_id: i64,
    next_restriction_id: i64,
    failing_start_dates: HashSet<NaiveDate>,
    failing_rent_models: HashSet<ModelId>,
    failing_restriction_models: HashSet<ModelId>,
}

impl InMemoryState {
    fn check_query(&self, dates: &DateRange) -> Result<()> {
        if self.failing_start_dates.contains(&dates.start()) {
            return Err(RentStoreError::Unavailable(format!(
                "injected failure for ranges starting {}",
                dates.start()
            )));
        }
        Ok(())
    }

    fn overlaps(&self, dates: &DateRange, model_id: ModelId) -> bool {
        self.restrictions
            .iter()
            .any(|r| r.model_id == model_id && r.dates.overlaps(dates))
    }

    fn push_rent(&mut self, rent: NewRent) -> Result<RentId> {
        if !self.models.contains_key(&rent.model_id) {
            return Err(RentStoreError::ModelNotFound(rent.model_id));
        }
        if self.failing_rent_models.contains(&rent.model_id) {
            return Err(RentStoreError::Unavailable(format!(
                "injected rent insert failure for model {}",
                rent.model_id
            )));
        }

        self.next_rent_id += 1;
        let id = RentId::new(self.next_rent_id);
        let now = Utc::now();
        self.rents.push(Rent {
            id,
            first_name: rent.first_name,
            last_name: rent.last_name,
            email: rent.email,
            phone: rent.phone,
            dates: rent.dates,
            model_id: rent.model_id,
            created_at: now,
            updated_at: now,
        });
        Ok(id)
    }

    fn push_restriction(&mut self, restriction: NewRentRestriction) -> Result<RestrictionId> {
        if !self.models.contains_key(&restriction.model_id) {
            return Err(RentStoreError::ModelNotFound(restriction.model_id));
        }
        if self.failing_restriction_models.contains(&restriction.model_id) {
            return Err(RentStoreError::Unavailable(format!(
                "injected restriction insert failure for model {}",
                restriction.model_id
            )));
        }

        self.next_restriction_id += 1;
        let id = RestrictionId::new(self.next_restriction_id);
        let now = Utc::now();
        self.restrictions.push(RentRestriction {
            id,
            dates: restriction.dates,
            model_id: restriction.model_id,
            rent_id: restriction.rent_id,
            kind: restriction.kind,
            created_at: now,
            updated_at: now,
        });
        Ok(id)
    }
}

/// In-memory rent store for tests and database-less runs.
///
/// Answers every query the way the PostgreSQL implementation does, and can
/// be told to fail specific operations deterministically.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRentRepository {
    state: Arc<RwLock<InMemoryState>>,
}

impl InMemoryRentRepository {
    /// Creates an empty store with no inventory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding the seed inventory (`Model 3`, `Model Y`).
    pub fn seeded() -> Self {
        Self::with_models(SEED_MODELS)
    }

    /// Creates a store holding the given models, numbered from 1.
    pub fn with_models<I, N>(names: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        let mut state = InMemoryState::default();
        for name in names {
            state.next_model_id += 1;
            let id = ModelId::new(state.next_model_id);
            let now = Utc::now();
            state.models.insert(
                id,
                VehicleModel {
                    id,
                    name: name.into(),
                    created_at: now,
                    updated_at: now,
                },
            );
        }
        Self {
            state: Arc::new(RwLock::new(state)),
        }
    }

    /// Makes every availability query whose range starts on `date` fail.
    pub async fn fail_queries_starting_on(&self, date: NaiveDate) {
        self.state.write().await.failing_start_dates.insert(date);
    }

    /// Makes `insert_rent` fail for rents of `model_id`.
    pub async fn fail_rent_insert_for(&self, model_id: ModelId) {
        self.state.write().await.failing_rent_models.insert(model_id);
    }

    /// Makes `insert_rent_restriction` fail for restrictions of `model_id`.
    pub async fn fail_restriction_insert_for(&self, model_id: ModelId) {
        self.state
            .write()
            .await
            .failing_restriction_models
            .insert(model_id);
    }

    /// Blocks `dates` for `model_id` without a rent, like an owner block.
    pub async fn block(&self, dates: DateRange, model_id: ModelId) -> Result<RestrictionId> {
        self.state.write().await.push_restriction(NewRentRestriction {
            dates,
            model_id,
            rent_id: None,
            kind: Default::default(),
        })
    }

    /// Returns the number of rents stored.
    pub async fn rent_count(&self) -> usize {
        self.state.read().await.rents.len()
    }

    /// Returns the number of restrictions stored.
    pub async fn restriction_count(&self) -> usize {
        self.state.read().await.restrictions.len()
    }

    /// Returns a copy of all stored rents in insertion order.
    pub async fn rents(&self) -> Vec<Rent> {
        self.state.read().await.rents.clone()
    }

    /// Returns a copy of all stored restrictions in insertion order.
    pub async fn restrictions(&self) -> Vec<RentRestriction> {
        self.state.read().await.restrictions.clone()
    }
}

#[async_trait]
impl RentRepository for InMemoryRentRepository {
    async fn all_models(&self) -> Result<Vec<VehicleModel>> {
        let state = self.state.read().await;
        Ok(state.models.values().cloned().collect())
    }

    async fn model_by_id(&self, id: ModelId) -> Result<VehicleModel> {
        let state = self.state.read().await;
        state
            .models
            .get(&id)
            .cloned()
            .ok_or(RentStoreError::ModelNotFound(id))
    }

    async fn overlap_exists(&self, dates: DateRange, model_id: ModelId) -> Result<bool> {
        let state = self.state.read().await;
        state.check_query(&dates)?;
        Ok(state.overlaps(&dates, model_id))
    }

    async fn overlapping_model_ids(&self, dates: DateRange) -> Result<BTreeSet<ModelId>> {
        let state = self.state.read().await;
        state.check_query(&dates)?;
        Ok(state
            .restrictions
            .iter()
            .filter(|r| r.dates.overlaps(&dates))
            .map(|r| r.model_id)
            .collect())
    }

    async fn insert_rent(&self, rent: NewRent) -> Result<RentId> {
        self.state.write().await.push_rent(rent)
    }

    async fn insert_rent_restriction(
        &self,
        restriction: NewRentRestriction,
    ) -> Result<RestrictionId> {
        self.state.write().await.push_restriction(restriction)
    }

    async fn commit_rent(&self, rent: NewRent) -> Result<CommittedRent> {
        let mut state = self.state.write().await;
        state.check_query(&rent.dates)?;

        if state.overlaps(&rent.dates, rent.model_id) {
            return Err(RentStoreError::Conflict {
                model_id: rent.model_id,
                dates: rent.dates,
            });
        }

        // Fail the restriction before touching the rent so nothing is left half-written.
        if state.failing_restriction_models.contains(&rent.model_id) {
            return Err(RentStoreError::Unavailable(format!(
                "injected restriction insert failure for model {}",
                rent.model_id
            )));
        }

        let template = rent.clone();
        let rent_id = state.push_rent(rent)?;
        let restriction_id = state.push_restriction(NewRentRestriction::for_rent(rent_id, &template))?;

        Ok(CommittedRent {
            rent_id,
            restriction_id,
        })
    }
}
