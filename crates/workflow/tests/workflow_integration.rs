//! End-to-end workflow tests over the in-memory store and sessions.

use common::ModelId;
use domain::{ContactDetails, DraftStage, RentDraft};
use rent_store::{DateRange, InMemoryRentRepository, RentRepositoryExt};
use workflow::{
    CommitStage, ContactOutcome, DRAFT_KEY, InMemorySessionStore, RentWorkflow, SessionId,
    SessionStoreExt, WorkflowError,
};

type TestWorkflow = RentWorkflow<InMemoryRentRepository, InMemorySessionStore>;

fn setup() -> (TestWorkflow, InMemoryRentRepository, InMemorySessionStore) {
    let store = InMemoryRentRepository::seeded();
    let sessions = InMemorySessionStore::default();
    let wf = RentWorkflow::new(store.clone(), sessions.clone());
    (wf, store, sessions)
}

fn john() -> ContactDetails {
    ContactDetails {
        first_name: "John".into(),
        last_name: "Smith".into(),
        email: "john@smith.com".into(),
        phone: "555-555-5555".into(),
    }
}

async fn stored_draft(sessions: &InMemorySessionStore, session: SessionId) -> Option<RentDraft> {
    sessions.get_as(session, DRAFT_KEY).await.unwrap()
}

#[tokio::test]
async fn full_rent_round_trip() {
    let (wf, store, sessions) = setup();
    let session = SessionId::new();

    let free = wf
        .submit_date_range(session, "2050-01-01", "2050-01-03")
        .await
        .unwrap();
    assert_eq!(free.len(), 2);

    let draft = wf.choose_model(session, ModelId::new(1)).await.unwrap();
    assert_eq!(draft.stage(), DraftStage::ItemChosen);

    let form_draft = wf.view_rent_form(session).await.unwrap();
    assert_eq!(form_draft.model().unwrap().name, "Model 3");

    let outcome = wf.submit_contact(session, john()).await.unwrap();
    let ContactOutcome::Committed { draft } = outcome else {
        panic!("expected committed outcome");
    };
    let rent_id = draft.rent_id().unwrap();

    let rents = store.rents().await;
    assert_eq!(rents.len(), 1);
    assert_eq!(rents[0].id, rent_id);
    assert_eq!(rents[0].email, "john@smith.com");
    let restrictions = store.restrictions().await;
    assert_eq!(restrictions.len(), 1);
    assert_eq!(restrictions[0].rent_id, Some(rent_id));

    let dates = DateRange::parse("2050-01-02", "2050-01-04").unwrap();
    assert!(!store.is_model_available(dates, ModelId::new(1)).await.unwrap());

    let summary = wf.view_summary(session).await.unwrap();
    assert_eq!(summary.contact().unwrap().first_name, "John");
    assert!(stored_draft(&sessions, session).await.is_none());

    // The summary is shown once.
    assert!(matches!(
        wf.view_summary(session).await,
        Err(WorkflowError::DraftMissing { .. })
    ));
}

#[tokio::test]
async fn choosing_same_model_twice_is_idempotent() {
    let (wf, _, sessions) = setup();
    let session = SessionId::new();
    wf.submit_date_range(session, "2050-01-01", "2050-01-03")
        .await
        .unwrap();

    wf.choose_model(session, ModelId::new(2)).await.unwrap();
    let once = stored_draft(&sessions, session).await;
    wf.choose_model(session, ModelId::new(2)).await.unwrap();
    let twice = stored_draft(&sessions, session).await;

    assert_eq!(once, twice);
}

#[tokio::test]
async fn new_dates_replace_previous_draft() {
    let (wf, _, sessions) = setup();
    let session = SessionId::new();
    wf.start_rent_for_model(session, ModelId::new(1), "2050-01-01", "2050-01-03")
        .await
        .unwrap();

    wf.submit_date_range(session, "2050-05-01", "2050-05-02")
        .await
        .unwrap();

    let draft = stored_draft(&sessions, session).await.unwrap();
    assert_eq!(draft.stage(), DraftStage::DatesSet);
    assert_eq!(
        draft.dates(),
        Some(DateRange::parse("2050-05-01", "2050-05-02").unwrap())
    );
}

#[tokio::test]
async fn scenario_free_model_is_listed() {
    let (wf, _, _) = setup();
    let free = wf
        .submit_date_range(SessionId::new(), "2022-01-02", "2022-01-03")
        .await
        .unwrap();
    assert!(free.iter().any(|m| m.id == ModelId::new(1)));
}

#[tokio::test]
async fn scenario_failing_backend_is_backend_unavailable() {
    let (wf, store, sessions) = setup();
    let session = SessionId::new();
    let range = DateRange::parse("2021-01-01", "2021-01-02").unwrap();
    store.fail_queries_starting_on(range.start()).await;

    let result = wf
        .submit_date_range(session, "2021-01-01", "2021-01-02")
        .await;

    assert!(matches!(result, Err(WorkflowError::BackendUnavailable(_))));
    assert!(stored_draft(&sessions, session).await.is_none());
}

#[tokio::test]
async fn scenario_missing_email_leaves_draft_unchanged() {
    let (wf, store, sessions) = setup();
    let session = SessionId::new();
    wf.start_rent_for_model(session, ModelId::new(1), "2050-01-01", "2050-01-03")
        .await
        .unwrap();
    let before = stored_draft(&sessions, session).await;

    let outcome = wf
        .submit_contact(
            session,
            ContactDetails {
                email: String::new(),
                ..john()
            },
        )
        .await
        .unwrap();

    let ContactOutcome::Invalid { form, .. } = outcome else {
        panic!("expected invalid outcome");
    };
    assert!(form.errors().get("email").is_some());
    assert_eq!(form.errors().len(), 1);
    assert_eq!(stored_draft(&sessions, session).await, before);
    assert_eq!(store.rent_count().await, 0);
}

#[tokio::test]
async fn scenario_summary_without_draft_is_draft_missing() {
    let (wf, _, _) = setup();
    assert!(matches!(
        wf.view_summary(SessionId::new()).await,
        Err(WorkflowError::DraftMissing {
            stage: DraftStage::Empty
        })
    ));
}

#[tokio::test]
async fn fully_booked_dates_are_no_availability() {
    let store = InMemoryRentRepository::with_models(["Model 3"]);
    let range = DateRange::parse("2050-01-01", "2050-01-10").unwrap();
    store.block(range, ModelId::new(1)).await.unwrap();
    let sessions = InMemorySessionStore::default();
    let wf = RentWorkflow::new(store, sessions.clone());
    let session = SessionId::new();

    let result = wf
        .submit_date_range(session, "2050-01-05", "2050-01-06")
        .await;

    assert!(matches!(result, Err(WorkflowError::NoAvailability(_))));
    assert!(stored_draft(&sessions, session).await.is_none());
}

#[tokio::test]
async fn restriction_failure_leaves_orphan_rent_under_two_step() {
    let (wf, store, sessions) = setup();
    let session = SessionId::new();
    store.fail_restriction_insert_for(ModelId::new(2)).await;
    wf.start_rent_for_model(session, ModelId::new(2), "2050-01-01", "2050-01-03")
        .await
        .unwrap();

    let result = wf.submit_contact(session, john()).await;

    assert!(matches!(
        result,
        Err(WorkflowError::CommitFailed {
            stage: CommitStage::Restriction,
            ..
        })
    ));
    assert_eq!(store.rent_count().await, 1);
    assert_eq!(store.restriction_count().await, 0);
    assert_eq!(
        stored_draft(&sessions, session).await.unwrap().stage(),
        DraftStage::ItemChosen
    );
}

#[tokio::test]
async fn rent_insert_failure_writes_nothing() {
    let (wf, store, _) = setup();
    let session = SessionId::new();
    store.fail_rent_insert_for(ModelId::new(1)).await;
    wf.start_rent_for_model(session, ModelId::new(1), "2050-01-01", "2050-01-03")
        .await
        .unwrap();

    let result = wf.submit_contact(session, john()).await;

    assert!(matches!(
        result,
        Err(WorkflowError::CommitFailed {
            stage: CommitStage::Rent,
            ..
        })
    ));
    assert_eq!(store.rent_count().await, 0);
}

#[tokio::test]
async fn single_model_probe_fails_closed() {
    let (wf, store, _) = setup();
    assert!(wf.check_single_model("2050-01-01", "2050-01-02", "1").await);

    assert!(!wf.check_single_model("nope", "2050-01-02", "1").await);
    assert!(!wf.check_single_model("2050-01-01", "2050-01-02", "x").await);

    let range = DateRange::parse("2021-01-01", "2021-01-02").unwrap();
    store.fail_queries_starting_on(range.start()).await;
    assert!(!wf.check_single_model("2021-01-01", "2021-01-02", "1").await);
}

#[tokio::test]
async fn sessions_do_not_share_drafts() {
    let (wf, _, _) = setup();
    let alice = SessionId::new();
    let bob = SessionId::new();

    wf.submit_date_range(alice, "2050-01-01", "2050-01-03")
        .await
        .unwrap();

    assert!(matches!(
        wf.choose_model(bob, ModelId::new(1)).await,
        Err(WorkflowError::DraftMissing { .. })
    ));
    assert!(wf.choose_model(alice, ModelId::new(1)).await.is_ok());
}
