//! The rent workflow orchestrator.

use std::str::FromStr;

use common::{DateRange, ModelId, RentId};
use domain::{
    AvailabilityService, ChosenModel, ContactDetails, DraftStage, Form, RentDraft, validate_contact,
};
use rent_store::{NewRent, NewRentRestriction, RentRepository, VehicleModel};

use crate::error::{CommitStage, Result, WorkflowError};
use crate::session::{SessionId, SessionStore, SessionStoreExt};

/// Session key the draft is stored under.
pub const DRAFT_KEY: &str = "rent";

/// How a validated rent is written to the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CommitPolicy {
    /// Insert the rent, then its restriction, as two independent writes.
    /// A failure between them leaves a rent without a restriction.
    #[default]
    TwoStep,
    /// Write both rows in one transaction after re-checking availability.
    Transactional,
}

impl FromStr for CommitPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "two-step" | "two_step" | "twostep" => Ok(CommitPolicy::TwoStep),
            "transactional" => Ok(CommitPolicy::Transactional),
            other => Err(format!("unknown commit policy: {other}")),
        }
    }
}

/// Result of submitting the rent form.
#[derive(Debug, Clone, PartialEq)]
pub enum ContactOutcome {
    /// Validation failed. Nothing was written; the draft carries the
    /// submitted values for re-display.
    Invalid { draft: RentDraft, form: Form },
    /// The rent and its restriction were written and the draft stored as
    /// committed.
    Committed { draft: RentDraft },
}

/// Parses a model id coming from a path or form value.
pub fn parse_model_id(raw: &str) -> Result<ModelId> {
    raw.parse::<ModelId>()
        .map_err(|_| WorkflowError::InvalidInput(format!("invalid model id: {raw:?}")))
}

/// Drives a rent from date selection to summary.
///
/// Holds no per-client state of its own: the draft is read from and written
/// back to the session store on every step, so one instance serves every
/// client concurrently.
pub struct RentWorkflow<R, S>
where
    R: RentRepository,
    S: SessionStore,
{
    store: R,
    availability: AvailabilityService<R>,
    sessions: S,
    commit_policy: CommitPolicy,
}

impl<R, S> RentWorkflow<R, S>
where
    R: RentRepository + Clone,
    S: SessionStore,
{
    /// Creates a workflow with the default two-step commit.
    pub fn new(store: R, sessions: S) -> Self {
        let availability = AvailabilityService::new(store.clone());
        Self {
            store,
            availability,
            sessions,
            commit_policy: CommitPolicy::default(),
        }
    }

    pub fn with_commit_policy(mut self, policy: CommitPolicy) -> Self {
        self.commit_policy = policy;
        self
    }

    pub fn commit_policy(&self) -> CommitPolicy {
        self.commit_policy
    }

    pub fn store(&self) -> &R {
        &self.store
    }

    pub fn sessions(&self) -> &S {
        &self.sessions
    }

    /// Lists the whole inventory.
    pub async fn models(&self) -> Result<Vec<VehicleModel>> {
        Ok(self.store.all_models().await?)
    }

    /// Looks up one model.
    pub async fn model(&self, model_id: ModelId) -> Result<VehicleModel> {
        Ok(self.store.model_by_id(model_id).await?)
    }

    /// Starts a draft for a date range and returns the free models.
    ///
    /// Any earlier draft is replaced. Nothing is written to the session when
    /// the dates are invalid, the store fails, or nothing is free.
    #[tracing::instrument(skip(self))]
    pub async fn submit_date_range(
        &self,
        session: SessionId,
        start_raw: &str,
        end_raw: &str,
    ) -> Result<Vec<VehicleModel>> {
        let dates = DateRange::parse(start_raw, end_raw)
            .map_err(|e| WorkflowError::InvalidInput(e.to_string()))?;

        let models = self.availability.available_models(dates).await?;
        if models.is_empty() {
            tracing::info!(%dates, "no models free");
            return Err(WorkflowError::NoAvailability(dates));
        }

        self.save_draft(session, &RentDraft::submit_dates(dates))
            .await?;
        Ok(models)
    }

    /// Answers whether one model is free for a date range.
    ///
    /// Fails closed: unparseable input and store failures both answer `false`.
    #[tracing::instrument(skip(self))]
    pub async fn check_single_model(
        &self,
        start_raw: &str,
        end_raw: &str,
        model_id_raw: &str,
    ) -> bool {
        let Ok(dates) = DateRange::parse(start_raw, end_raw) else {
            tracing::debug!("probe dates invalid");
            return false;
        };
        let Ok(model_id) = parse_model_id(model_id_raw) else {
            tracing::debug!("probe model id invalid");
            return false;
        };

        match self.availability.is_model_available(dates, model_id).await {
            Ok(available) => available,
            Err(e) => {
                tracing::warn!(error = %e, "availability probe failed, answering unavailable");
                false
            }
        }
    }

    /// Picks a model for the draft in session.
    ///
    /// Picking the same model twice leaves the draft unchanged.
    #[tracing::instrument(skip(self))]
    pub async fn choose_model(&self, session: SessionId, model_id: ModelId) -> Result<RentDraft> {
        let draft = self.load_draft(session).await?;
        if !matches!(
            draft.stage(),
            DraftStage::DatesSet | DraftStage::ItemChosen | DraftStage::ContactSubmitted
        ) {
            return Err(WorkflowError::DraftMissing {
                stage: draft.stage(),
            });
        }

        let model = self.store.model_by_id(model_id).await?;
        let draft = draft.choose_model(ChosenModel::from(model))?;
        self.save_draft(session, &draft).await?;
        Ok(draft)
    }

    /// Starts a draft with dates and model already known, replacing any
    /// earlier draft. Availability is not re-checked here.
    #[tracing::instrument(skip(self))]
    pub async fn start_rent_for_model(
        &self,
        session: SessionId,
        model_id: ModelId,
        start_raw: &str,
        end_raw: &str,
    ) -> Result<RentDraft> {
        let dates = DateRange::parse(start_raw, end_raw)
            .map_err(|e| WorkflowError::InvalidInput(e.to_string()))?;
        let model = self.store.model_by_id(model_id).await?;

        let draft = RentDraft::for_model(dates, ChosenModel::from(model));
        self.save_draft(session, &draft).await?;
        Ok(draft)
    }

    /// Returns the draft to pre-fill the rent form. Read-only.
    pub async fn view_rent_form(&self, session: SessionId) -> Result<RentDraft> {
        let draft = self.load_draft(session).await?;
        match draft.stage() {
            DraftStage::ItemChosen | DraftStage::ContactSubmitted | DraftStage::Committed => {
                Ok(draft)
            }
            stage => Err(WorkflowError::DraftMissing { stage }),
        }
    }

    /// Validates contact details and, when valid, commits the rent.
    ///
    /// An invalid form returns [`ContactOutcome::Invalid`] and writes nothing
    /// to the session or the store.
    #[tracing::instrument(skip(self, contact))]
    pub async fn submit_contact(
        &self,
        session: SessionId,
        contact: ContactDetails,
    ) -> Result<ContactOutcome> {
        let form = validate_contact(&contact);
        let draft = self.load_draft(session).await?.submit_contact(contact)?;

        if !form.valid() {
            tracing::debug!(errors = form.errors().len(), "rent form invalid");
            return Ok(ContactOutcome::Invalid { draft, form });
        }

        let new_rent = draft.to_new_rent()?;
        let rent_id = self.commit(new_rent).await?;

        let draft = draft.commit(rent_id)?;
        self.save_draft(session, &draft).await?;
        Ok(ContactOutcome::Committed { draft })
    }

    /// Returns the committed draft and removes it, so a second view finds
    /// nothing. A draft in any other state is left in place.
    #[tracing::instrument(skip(self))]
    pub async fn view_summary(&self, session: SessionId) -> Result<RentDraft> {
        let draft = self.load_draft(session).await?;
        if draft.stage() != DraftStage::Committed {
            return Err(WorkflowError::DraftMissing {
                stage: draft.stage(),
            });
        }

        self.sessions.remove(session, DRAFT_KEY).await?;
        Ok(draft)
    }

    async fn commit(&self, new_rent: NewRent) -> Result<RentId> {
        let started = std::time::Instant::now();
        let model_id = new_rent.model_id;
        let dates = new_rent.dates;

        let result = match self.commit_policy {
            CommitPolicy::TwoStep => self.commit_two_step(new_rent).await,
            CommitPolicy::Transactional => self
                .store
                .commit_rent(new_rent)
                .await
                .map(|committed| committed.rent_id)
                .map_err(|source| WorkflowError::CommitFailed {
                    stage: CommitStage::Transaction,
                    source,
                }),
        };

        metrics::histogram!("rent_commit_duration_seconds").record(started.elapsed().as_secs_f64());
        match &result {
            Ok(rent_id) => {
                metrics::counter!("rents_committed_total").increment(1);
                tracing::info!(%rent_id, %model_id, %dates, "rent committed");
            }
            Err(WorkflowError::CommitFailed { stage, source }) => {
                metrics::counter!("rent_commit_failures_total", "stage" => stage.as_str())
                    .increment(1);
                tracing::error!(%stage, error = %source, %model_id, %dates, "rent commit failed");
            }
            Err(_) => {}
        }
        result
    }

    async fn commit_two_step(&self, new_rent: NewRent) -> Result<RentId> {
        let rent_id = self
            .store
            .insert_rent(new_rent.clone())
            .await
            .map_err(|source| WorkflowError::CommitFailed {
                stage: CommitStage::Rent,
                source,
            })?;

        self.store
            .insert_rent_restriction(NewRentRestriction::for_rent(rent_id, &new_rent))
            .await
            .map_err(|source| {
                tracing::error!(%rent_id, "rent written without its restriction");
                WorkflowError::CommitFailed {
                    stage: CommitStage::Restriction,
                    source,
                }
            })?;

        Ok(rent_id)
    }

    async fn load_draft(&self, session: SessionId) -> Result<RentDraft> {
        Ok(self
            .sessions
            .get_as::<RentDraft>(session, DRAFT_KEY)
            .await?
            .unwrap_or_default())
    }

    async fn save_draft(&self, session: SessionId, draft: &RentDraft) -> Result<()> {
        self.sessions.put_as(session, DRAFT_KEY, draft).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rent_store::InMemoryRentRepository;

    use super::*;
    use crate::session::InMemorySessionStore;

    fn workflow() -> RentWorkflow<InMemoryRentRepository, InMemorySessionStore> {
        RentWorkflow::new(
            InMemoryRentRepository::seeded(),
            InMemorySessionStore::default(),
        )
    }

    fn contact(first_name: &str, email: &str) -> ContactDetails {
        ContactDetails {
            first_name: first_name.into(),
            last_name: "Smith".into(),
            email: email.into(),
            phone: "555-555-5555".into(),
        }
    }

    #[test]
    fn commit_policy_parses() {
        assert_eq!("two-step".parse::<CommitPolicy>(), Ok(CommitPolicy::TwoStep));
        assert_eq!(
            " Transactional ".parse::<CommitPolicy>(),
            Ok(CommitPolicy::Transactional)
        );
        assert!("eventually".parse::<CommitPolicy>().is_err());
    }

    #[test]
    fn model_id_parse_errors_are_invalid_input() {
        assert_eq!(parse_model_id("2").unwrap(), ModelId::new(2));
        assert!(matches!(
            parse_model_id("two"),
            Err(WorkflowError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn invalid_dates_leave_session_untouched() {
        let wf = workflow();
        let session = SessionId::new();

        for (start, end) in [("invalid", "2050-01-02"), ("2050-01-02", "2050-01-02")] {
            let result = wf.submit_date_range(session, start, end).await;
            assert!(matches!(result, Err(WorkflowError::InvalidInput(_))));
        }
        assert!(wf.sessions().get(session, DRAFT_KEY).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn choose_model_without_draft_is_draft_missing() {
        let wf = workflow();
        let result = wf.choose_model(SessionId::new(), ModelId::new(1)).await;
        assert!(matches!(
            result,
            Err(WorkflowError::DraftMissing {
                stage: DraftStage::Empty
            })
        ));
    }

    #[tokio::test]
    async fn choose_unknown_model_is_item_not_found() {
        let wf = workflow();
        let session = SessionId::new();
        wf.submit_date_range(session, "2050-01-01", "2050-01-02")
            .await
            .unwrap();

        let result = wf.choose_model(session, ModelId::new(99)).await;
        assert!(matches!(result, Err(WorkflowError::ItemNotFound(_))));
        let draft = wf.load_draft(session).await.unwrap();
        assert_eq!(draft.stage(), DraftStage::DatesSet);
    }

    #[tokio::test]
    async fn invalid_contact_writes_nothing() {
        let wf = workflow();
        let session = SessionId::new();
        wf.start_rent_for_model(session, ModelId::new(1), "2050-01-01", "2050-01-02")
            .await
            .unwrap();

        let outcome = wf
            .submit_contact(session, contact("J", "not-an-email"))
            .await
            .unwrap();
        let ContactOutcome::Invalid { draft, form } = outcome else {
            panic!("expected invalid outcome");
        };
        assert_eq!(draft.contact().unwrap().first_name, "J");
        assert!(form.errors().get("first_name").is_some());
        assert!(form.errors().get("email").is_some());

        assert_eq!(wf.store().rent_count().await, 0);
        let stored = wf.load_draft(session).await.unwrap();
        assert_eq!(stored.stage(), DraftStage::ItemChosen);
    }

    #[tokio::test]
    async fn submit_contact_on_dates_only_draft_is_draft_missing() {
        let wf = workflow();
        let session = SessionId::new();
        wf.submit_date_range(session, "2050-01-01", "2050-01-02")
            .await
            .unwrap();

        let result = wf
            .submit_contact(session, contact("John", "john@smith.com"))
            .await;
        assert!(matches!(
            result,
            Err(WorkflowError::DraftMissing {
                stage: DraftStage::DatesSet
            })
        ));
    }

    #[tokio::test]
    async fn transactional_policy_commits_both_rows() {
        let wf = workflow().with_commit_policy(CommitPolicy::Transactional);
        let session = SessionId::new();
        wf.start_rent_for_model(session, ModelId::new(2), "2050-02-01", "2050-02-03")
            .await
            .unwrap();

        let outcome = wf
            .submit_contact(session, contact("John", "john@smith.com"))
            .await
            .unwrap();
        assert!(matches!(outcome, ContactOutcome::Committed { .. }));
        assert_eq!(wf.store().rent_count().await, 1);
        assert_eq!(wf.store().restriction_count().await, 1);
    }

    #[tokio::test]
    async fn transactional_policy_rejects_double_booking() {
        let wf = workflow().with_commit_policy(CommitPolicy::Transactional);
        let first = SessionId::new();
        let second = SessionId::new();
        for session in [first, second] {
            wf.start_rent_for_model(session, ModelId::new(1), "2050-02-01", "2050-02-05")
                .await
                .unwrap();
        }

        wf.submit_contact(first, contact("John", "john@smith.com"))
            .await
            .unwrap();
        let result = wf
            .submit_contact(second, contact("Jane", "jane@doe.com"))
            .await;

        assert!(matches!(
            result,
            Err(WorkflowError::CommitFailed {
                stage: CommitStage::Transaction,
                ..
            })
        ));
        assert_eq!(wf.store().rent_count().await, 1);
    }

    #[tokio::test]
    async fn view_summary_on_uncommitted_draft_keeps_it() {
        let wf = workflow();
        let session = SessionId::new();
        wf.start_rent_for_model(session, ModelId::new(1), "2050-01-01", "2050-01-02")
            .await
            .unwrap();

        assert!(matches!(
            wf.view_summary(session).await,
            Err(WorkflowError::DraftMissing {
                stage: DraftStage::ItemChosen
            })
        ));
        assert_eq!(
            wf.load_draft(session).await.unwrap().stage(),
            DraftStage::ItemChosen
        );
    }
}
