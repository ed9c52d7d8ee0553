use std::collections::BTreeSet;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sqlx::{PgPool, Row, postgres::PgPoolOptions, postgres::PgRow};

use crate::{
    CommittedRent, DateRange, ModelId, NewRent, NewRentRestriction, RentId, RentStoreError,
    RestrictionId, Result, VehicleModel, store::RentRepository,
};

/// Timeout applied to every query unless overridden.
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(3);

const MAX_OPEN_CONNECTIONS: u32 = 10;
const MIN_IDLE_CONNECTIONS: u32 = 5;
const MAX_CONNECTION_LIFETIME: Duration = Duration::from_secs(5 * 60);

/// Opens a connection pool and checks that the database answers.
pub async fn connect(database_url: &str) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(MAX_OPEN_CONNECTIONS)
        .min_connections(MIN_IDLE_CONNECTIONS)
        .max_lifetime(MAX_CONNECTION_LIFETIME)
        .acquire_timeout(DEFAULT_QUERY_TIMEOUT)
        .connect(database_url)
        .await?;

    sqlx::query("SELECT 1").execute(&pool).await?;
    Ok(pool)
}

/// PostgreSQL-backed rent store implementation.
#[derive(Clone)]
pub struct PostgresRentRepository {
    pool: PgPool,
    query_timeout: Duration,
}

impl PostgresRentRepository {
    /// Creates a new PostgreSQL rent store with the default query timeout.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            query_timeout: DEFAULT_QUERY_TIMEOUT,
        }
    }

    /// Overrides the per-query timeout.
    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    async fn bounded<T, E, F>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, E>>,
        E: Into<RentStoreError>,
    {
        match tokio::time::timeout(self.query_timeout, fut).await {
            Ok(result) => result.map_err(Into::into),
            Err(_) => {
                metrics::counter!("rent_store_timeouts_total").increment(1);
                tracing::warn!(timeout = ?self.query_timeout, "rent store query timed out");
                Err(RentStoreError::Timeout(self.query_timeout))
            }
        }
    }

    fn row_to_model(row: PgRow) -> Result<VehicleModel> {
        Ok(VehicleModel {
            id: ModelId::new(row.try_get("id")?),
            name: row.try_get("model_name")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn map_insert_error(e: sqlx::Error, model_id: ModelId) -> RentStoreError {
        // A dangling model id surfaces as a foreign key violation.
        if let sqlx::Error::Database(ref db_err) = e
            && matches!(
                db_err.constraint(),
                Some("rents_model_id_fkey" | "rent_restrictions_model_id_fkey")
            )
        {
            return RentStoreError::ModelNotFound(model_id);
        }
        RentStoreError::Database(e)
    }
}

const SELECT_OVERLAP_COUNT: &str = r#"
    SELECT COUNT(id)
    FROM rent_restrictions
    WHERE model_id = $1 AND $2 < end_date AND $3 > start_date
"#;

const INSERT_RENT: &str = r#"
    INSERT INTO rents (first_name, last_name, email, phone, start_date, end_date, model_id, created_at, updated_at)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
    RETURNING id
"#;

const INSERT_RESTRICTION: &str = r#"
    INSERT INTO rent_restrictions (start_date, end_date, model_id, rent_id, restriction_id, created_at, updated_at)
    VALUES ($1, $2, $3, $4, $5, $6, $7)
    RETURNING id
"#;

fn bind_range(dates: &DateRange) -> (NaiveDate, NaiveDate) {
    (dates.start(), dates.end())
}

#[async_trait]
impl RentRepository for PostgresRentRepository {
    async fn all_models(&self) -> Result<Vec<VehicleModel>> {
        let rows = self
            .bounded(
                sqlx::query(
                    r#"
                    SELECT id, model_name, created_at, updated_at
                    FROM models
                    ORDER BY id ASC
                    "#,
                )
                .fetch_all(&self.pool),
            )
            .await?;

        rows.into_iter().map(Self::row_to_model).collect()
    }

    async fn model_by_id(&self, id: ModelId) -> Result<VehicleModel> {
        let row: Option<PgRow> = self
            .bounded(
                sqlx::query(
                    r#"
                    SELECT id, model_name, created_at, updated_at
                    FROM models
                    WHERE id = $1
                    "#,
                )
                .bind(id.as_i64())
                .fetch_optional(&self.pool),
            )
            .await?;

        match row {
            Some(row) => Self::row_to_model(row),
            None => Err(RentStoreError::ModelNotFound(id)),
        }
    }

    async fn overlap_exists(&self, dates: DateRange, model_id: ModelId) -> Result<bool> {
        let (start, end) = bind_range(&dates);
        let count: i64 = self
            .bounded(
                sqlx::query_scalar(SELECT_OVERLAP_COUNT)
                    .bind(model_id.as_i64())
                    .bind(start)
                    .bind(end)
                    .fetch_one(&self.pool),
            )
            .await?;

        Ok(count > 0)
    }

    async fn overlapping_model_ids(&self, dates: DateRange) -> Result<BTreeSet<ModelId>> {
        let (start, end) = bind_range(&dates);
        let ids: Vec<i64> = self
            .bounded(
                sqlx::query_scalar(
                    r#"
                    SELECT DISTINCT model_id
                    FROM rent_restrictions
                    WHERE $1 < end_date AND $2 > start_date
                    "#,
                )
                .bind(start)
                .bind(end)
                .fetch_all(&self.pool),
            )
            .await?;

        Ok(ids.into_iter().map(ModelId::new).collect())
    }

    async fn insert_rent(&self, rent: NewRent) -> Result<RentId> {
        let now = Utc::now();
        let model_id = rent.model_id;
        let id: i64 = self
            .bounded(async {
                sqlx::query_scalar(INSERT_RENT)
                    .bind(&rent.first_name)
                    .bind(&rent.last_name)
                    .bind(&rent.email)
                    .bind(&rent.phone)
                    .bind(rent.dates.start())
                    .bind(rent.dates.end())
                    .bind(model_id.as_i64())
                    .bind(now)
                    .bind(now)
                    .fetch_one(&self.pool)
                    .await
                    .map_err(|e| Self::map_insert_error(e, model_id))
            })
            .await?;

        Ok(RentId::new(id))
    }

    async fn insert_rent_restriction(
        &self,
        restriction: NewRentRestriction,
    ) -> Result<RestrictionId> {
        let now = Utc::now();
        let model_id = restriction.model_id;
        let id: i64 = self
            .bounded(async {
                sqlx::query_scalar(INSERT_RESTRICTION)
                    .bind(restriction.dates.start())
                    .bind(restriction.dates.end())
                    .bind(model_id.as_i64())
                    .bind(restriction.rent_id.map(|id| id.as_i64()))
                    .bind(restriction.kind.id())
                    .bind(now)
                    .bind(now)
                    .fetch_one(&self.pool)
                    .await
                    .map_err(|e| Self::map_insert_error(e, model_id))
            })
            .await?;

        Ok(RestrictionId::new(id))
    }

    async fn commit_rent(&self, rent: NewRent) -> Result<CommittedRent> {
        let model_id = rent.model_id;
        let dates = rent.dates;

        self.bounded(async {
            let now = Utc::now();
            let mut tx = self.pool.begin().await?;

            // Serializes commits per model until the transaction ends.
            sqlx::query("SELECT pg_advisory_xact_lock($1)")
                .bind(model_id.as_i64())
                .execute(&mut *tx)
                .await?;

            let overlapping: i64 = sqlx::query_scalar(SELECT_OVERLAP_COUNT)
                .bind(model_id.as_i64())
                .bind(dates.start())
                .bind(dates.end())
                .fetch_one(&mut *tx)
                .await?;

            if overlapping > 0 {
                return Err(RentStoreError::Conflict { model_id, dates });
            }

            let rent_id: i64 = sqlx::query_scalar(INSERT_RENT)
                .bind(&rent.first_name)
                .bind(&rent.last_name)
                .bind(&rent.email)
                .bind(&rent.phone)
                .bind(dates.start())
                .bind(dates.end())
                .bind(model_id.as_i64())
                .bind(now)
                .bind(now)
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| Self::map_insert_error(e, model_id))?;

            let restriction = NewRentRestriction::for_rent(RentId::new(rent_id), &rent);
            let restriction_id: i64 = sqlx::query_scalar(INSERT_RESTRICTION)
                .bind(dates.start())
                .bind(dates.end())
                .bind(model_id.as_i64())
                .bind(rent_id)
                .bind(restriction.kind.id())
                .bind(now)
                .bind(now)
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| Self::map_insert_error(e, model_id))?;

            tx.commit().await?;

            Ok::<_, RentStoreError>(CommittedRent {
                rent_id: RentId::new(rent_id),
                restriction_id: RestrictionId::new(restriction_id),
            })
        })
        .await
    }
}
