//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container for efficiency.
//! Run with:
//!
//! ```bash
//! cargo test -p rent-store --test postgres_integration -- --test-threads=1
//! ```

use std::sync::Arc;
use std::time::Duration;

use rent_store::{
    DateRange, ModelId, NewRent, NewRentRestriction, PostgresRentRepository, RentRepository,
    RentRepositoryExt, RentStoreError,
};
use serial_test::serial;
use sqlx::PgPool;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

/// Global shared container
static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let temp_pool = PgPool::connect(&connection_string).await.unwrap();
            PostgresRentRepository::new(temp_pool.clone())
                .run_migrations()
                .await
                .unwrap();
            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh store with its own pool and no rents or restrictions.
async fn get_test_store() -> PostgresRentRepository {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE rent_restrictions, rents RESTART IDENTITY")
        .execute(&pool)
        .await
        .unwrap();

    PostgresRentRepository::new(pool)
}

fn dates(start: &str, end: &str) -> DateRange {
    DateRange::parse(start, end).unwrap()
}

fn new_rent(model_id: ModelId, range: DateRange) -> NewRent {
    NewRent {
        first_name: "John".into(),
        last_name: "Smith".into(),
        email: "john@smith.com".into(),
        phone: "555-555-5555".into(),
        dates: range,
        model_id,
    }
}

async fn count(store: &PostgresRentRepository, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(store.pool())
        .await
        .unwrap()
}

#[tokio::test]
#[serial]
async fn seed_inventory_is_present() {
    let store = get_test_store().await;

    let models = store.all_models().await.unwrap();
    let names: Vec<_> = models.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["Model 3", "Model Y"]);

    let model = store.model_by_id(models[1].id).await.unwrap();
    assert_eq!(model.name, "Model Y");
}

#[tokio::test]
#[serial]
async fn unknown_model_is_not_found() {
    let store = get_test_store().await;
    let result = store.model_by_id(ModelId::new(999)).await;
    assert!(matches!(result, Err(RentStoreError::ModelNotFound(_))));
}

#[tokio::test]
#[serial]
async fn rent_and_restriction_make_model_unavailable() {
    let store = get_test_store().await;
    let model = ModelId::new(1);
    let booked = dates("2050-01-01", "2050-01-03");

    let rent = new_rent(model, booked);
    let rent_id = store.insert_rent(rent.clone()).await.unwrap();
    store
        .insert_rent_restriction(NewRentRestriction::for_rent(rent_id, &rent))
        .await
        .unwrap();

    assert!(
        !store
            .is_model_available(dates("2050-01-02", "2050-01-04"), model)
            .await
            .unwrap()
    );
    assert!(
        store
            .is_model_available(dates("2050-01-03", "2050-01-05"), model)
            .await
            .unwrap()
    );

    let blocked = store
        .overlapping_model_ids(dates("2049-12-31", "2050-01-02"))
        .await
        .unwrap();
    assert!(blocked.contains(&model));
    assert!(!blocked.contains(&ModelId::new(2)));
}

#[tokio::test]
#[serial]
async fn insert_rent_for_unknown_model_maps_foreign_key_violation() {
    let store = get_test_store().await;
    let result = store
        .insert_rent(new_rent(ModelId::new(999), dates("2050-01-01", "2050-01-02")))
        .await;
    assert!(matches!(result, Err(RentStoreError::ModelNotFound(_))));
}

#[tokio::test]
#[serial]
async fn commit_rent_is_atomic_and_rejects_overlap() {
    let store = get_test_store().await;
    let model = ModelId::new(2);

    let committed = store
        .commit_rent(new_rent(model, dates("2050-03-01", "2050-03-05")))
        .await
        .unwrap();
    assert!(committed.rent_id.as_i64() > 0);

    let conflict = store
        .commit_rent(new_rent(model, dates("2050-03-04", "2050-03-06")))
        .await;
    assert!(matches!(conflict, Err(RentStoreError::Conflict { .. })));

    assert_eq!(count(&store, "rents").await, 1);
    assert_eq!(count(&store, "rent_restrictions").await, 1);
}

#[tokio::test]
#[serial]
async fn concurrent_commits_for_same_model_book_once() {
    let store = get_test_store().await;
    let model = ModelId::new(1);
    let range = dates("2050-06-01", "2050-06-08");

    let (a, b) = tokio::join!(
        store.commit_rent(new_rent(model, range)),
        store.commit_rent(new_rent(model, range)),
    );

    assert_eq!([a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count(), 1);
    assert_eq!(count(&store, "rent_restrictions").await, 1);
}

#[tokio::test]
#[serial]
async fn query_timeout_reports_timeout() {
    let store = get_test_store()
        .await
        .with_query_timeout(Duration::from_nanos(1));

    let result = store.all_models().await;
    assert!(matches!(result, Err(RentStoreError::Timeout(_))));
}
