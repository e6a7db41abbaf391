//! Postgres repository implementation using Diesel.
//!
//! Observation tables (`store_status`, `business_hours`, `store_timezones`) are
//! populated by the ingestion tooling; this repository only reads them. The
//! `report_status` table is owned by the report pipeline.
//!
//! ## Features
//!
//! - Connection pooling with r2d2
//! - Automatic retry for transient failures
//! - Automatic migration execution
//!
//! ## Configuration
//!
//! Environment variables:
//! - `DATABASE_URL` or `PG_DATABASE_URL`: Connection string (required)
//! - `PG_POOL_MAX`: Maximum pool size (default: 10)
//! - `PG_POOL_MIN`: Minimum pool size (default: 1)
//! - `PG_CONN_TIMEOUT_SEC`: Connection timeout in seconds (default: 30)
//! - `PG_IDLE_TIMEOUT_SEC`: Idle connection timeout in seconds (default: 600)
//! - `PG_MAX_RETRIES`: Maximum retry attempts for transient failures (default: 3)
//! - `PG_RETRY_DELAY_MS`: Initial retry delay in milliseconds (default: 100)

use async_trait::async_trait;
use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sql_query;
use diesel::sql_types::BigInt;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::time::Duration;
use tokio::task;

use crate::db::repository::{
    ErrorContext, ObservationRepository, ReportRepository, RepositoryError, RepositoryResult,
};
use crate::models::{
    BusinessHourRule, Poll, PollStatus, ReportId, ReportJob, ReportStatus, StoreDetails, StoreId,
    TimezoneAssignment,
};

mod models;
mod schema;

use models::*;
use schema::*;

type PgPool = Pool<ConnectionManager<PgConnection>>;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("src/db/repositories/postgres/migrations");

/// Distinct store ids across every observation table.
const FLEET_SUBQUERY: &str = "SELECT store_id FROM store_status \
     UNION SELECT store_id FROM business_hours \
     UNION SELECT store_id FROM store_timezones";

/// Configuration for connecting to Postgres.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL
    pub database_url: String,
    /// Maximum number of connections in the pool
    pub max_pool_size: u32,
    /// Minimum number of connections in the pool
    pub min_pool_size: u32,
    /// Connection timeout in seconds
    pub connection_timeout_sec: u64,
    /// Idle connection timeout in seconds
    pub idle_timeout_sec: u64,
    /// Maximum number of retry attempts for transient failures
    pub max_retries: u32,
    /// Initial retry delay in milliseconds (doubles with each retry)
    pub retry_delay_ms: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            max_pool_size: 10,
            min_pool_size: 1,
            connection_timeout_sec: 30,
            idle_timeout_sec: 600,
            max_retries: 3,
            retry_delay_ms: 100,
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

impl PostgresConfig {
    /// Create configuration from environment variables.
    pub fn from_env() -> Result<Self, String> {
        let database_url = std::env::var("DATABASE_URL")
            .or_else(|_| std::env::var("PG_DATABASE_URL"))
            .map_err(|_| "DATABASE_URL or PG_DATABASE_URL must be set".to_string())?;

        let defaults = Self::default();
        Ok(Self {
            database_url,
            max_pool_size: env_or("PG_POOL_MAX", defaults.max_pool_size),
            min_pool_size: env_or("PG_POOL_MIN", defaults.min_pool_size),
            connection_timeout_sec: env_or("PG_CONN_TIMEOUT_SEC", defaults.connection_timeout_sec),
            idle_timeout_sec: env_or("PG_IDLE_TIMEOUT_SEC", defaults.idle_timeout_sec),
            max_retries: env_or("PG_MAX_RETRIES", defaults.max_retries),
            retry_delay_ms: env_or("PG_RETRY_DELAY_MS", defaults.retry_delay_ms),
        })
    }

}

/// Diesel-backed repository for Postgres.
#[derive(Clone, Debug)]
pub struct PostgresRepository {
    pool: PgPool,
    config: PostgresConfig,
}

impl PostgresRepository {
    /// Create a new repository and run pending migrations.
    pub fn new(config: PostgresConfig) -> RepositoryResult<Self> {
        let manager = ConnectionManager::<PgConnection>::new(&config.database_url);

        let pool = Pool::builder()
            .max_size(config.max_pool_size)
            .min_idle(Some(config.min_pool_size))
            .connection_timeout(Duration::from_secs(config.connection_timeout_sec))
            .idle_timeout(Some(Duration::from_secs(config.idle_timeout_sec)))
            .test_on_check_out(true)
            .build(manager)
            .map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("create_pool")
                        .with_details(format!("max_size={}", config.max_pool_size)),
                )
            })?;

        {
            let mut conn = pool.get().map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("get_connection_for_migrations"),
                )
            })?;
            conn.run_pending_migrations(MIGRATIONS).map_err(|e| {
                RepositoryError::internal_with_context(
                    format!("Migration failed: {}", e),
                    ErrorContext::new("run_migrations"),
                )
            })?;
        }

        Ok(Self { pool, config })
    }

    /// Execute a database operation with automatic retry for transient failures.
    ///
    /// Runs on the blocking pool; retries up to `max_retries` times with
    /// exponential backoff when the error is retryable.
    async fn with_conn<T, F>(&self, f: F) -> RepositoryResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> RepositoryResult<T> + Send + 'static + Clone,
    {
        let pool = self.pool.clone();
        let max_retries = self.config.max_retries;
        let retry_delay_ms = self.config.retry_delay_ms;

        task::spawn_blocking(move || {
            let mut last_error = None;
            let mut retry_delay = Duration::from_millis(retry_delay_ms);

            for attempt in 0..=max_retries {
                if attempt > 0 {
                    if let Some(ref err) = last_error {
                        log::warn!("Retrying after attempt {} failed: {}", attempt, err);
                    }
                    std::thread::sleep(retry_delay);
                    retry_delay *= 2;
                }

                let mut conn = match pool.get() {
                    Ok(c) => c,
                    Err(e) => {
                        let err = RepositoryError::connection_with_context(
                            e.to_string(),
                            ErrorContext::new("get_connection")
                                .with_details(format!("attempt={}", attempt + 1)),
                        );
                        if attempt < max_retries {
                            last_error = Some(err);
                            continue;
                        }
                        return Err(err);
                    }
                };

                match f.clone()(&mut conn) {
                    Ok(result) => return Ok(result),
                    Err(e) if e.is_retryable() && attempt < max_retries => {
                        last_error = Some(e);
                        continue;
                    }
                    Err(e) => return Err(e),
                }
            }

            Err(last_error.unwrap_or_else(|| {
                RepositoryError::internal("Max retries exceeded with no error captured")
            }))
        })
        .await
        .map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Task join error: {}", e),
                ErrorContext::new("spawn_blocking"),
            )
        })?
    }
}

fn map_diesel_error(err: diesel::result::Error) -> RepositoryError {
    RepositoryError::from(err)
}

fn row_to_poll(row: StoreStatusRow) -> RepositoryResult<Poll> {
    let status: PollStatus = row.status.parse().map_err(|e: String| {
        RepositoryError::validation_with_context(
            e,
            ErrorContext::new("fetch_polls")
                .with_entity("store_status")
                .with_entity_id(row.store_id),
        )
    })?;
    Ok(Poll::new(
        StoreId::new(row.store_id),
        row.timestamp_utc.and_utc(),
        status,
    ))
}

fn row_to_rule(row: BusinessHoursRow) -> RepositoryResult<BusinessHourRule> {
    let day = u8::try_from(row.day_of_week).map_err(|_| {
        RepositoryError::validation(format!(
            "day_of_week {} out of range for store {}",
            row.day_of_week, row.store_id
        ))
    })?;
    BusinessHourRule::new(
        StoreId::new(row.store_id),
        day,
        row.start_time_local,
        row.end_time_local,
    )
    .map_err(|e| {
        RepositoryError::validation_with_context(
            e,
            ErrorContext::new("fetch_business_hours")
                .with_entity("business_hours")
                .with_entity_id(row.store_id),
        )
    })
}

fn row_to_job(row: ReportStatusRow) -> RepositoryResult<ReportJob> {
    let status: ReportStatus = row.status.parse().map_err(|e: String| {
        RepositoryError::validation_with_context(
            e,
            ErrorContext::new("get_report")
                .with_entity("report")
                .with_entity_id(row.report_id),
        )
    })?;
    Ok(ReportJob {
        report_id: ReportId::new(row.report_id),
        status,
        result: row.result,
        created_at: row.created_at,
        completed_at: row.completed_at,
    })
}

fn raw_ids(store_ids: &[StoreId]) -> Vec<i64> {
    store_ids.iter().map(|id| id.value()).collect()
}

/// Move a `Running` job to a terminal state inside one connection.
fn finish_report(
    conn: &mut PgConnection,
    report_id: ReportId,
    status: ReportStatus,
    result: Option<String>,
    operation: &str,
) -> RepositoryResult<()> {
    let context = ErrorContext::new(operation)
        .with_entity("report")
        .with_entity_id(report_id);

    let updated = diesel::update(
        report_status::table
            .filter(report_status::report_id.eq(report_id.value()))
            .filter(report_status::status.eq(ReportStatus::Running.as_str())),
    )
    .set((
        report_status::status.eq(status.as_str()),
        report_status::result.eq(result),
        report_status::completed_at.eq(Some(Utc::now())),
    ))
    .execute(conn)
    .map_err(|e| map_diesel_error(e).with_operation(operation))?;

    if updated == 1 {
        return Ok(());
    }

    let current: Option<String> = report_status::table
        .filter(report_status::report_id.eq(report_id.value()))
        .select(report_status::status)
        .first(conn)
        .optional()
        .map_err(map_diesel_error)?;

    match current {
        None => Err(RepositoryError::not_found_with_context(
            format!("Report {} not found", report_id),
            context,
        )),
        Some(current) => Err(RepositoryError::validation_with_context(
            format!("Report {} already finished as {}", report_id, current),
            context,
        )),
    }
}

#[async_trait]
impl ObservationRepository for PostgresRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        self.with_conn(|conn| {
            sql_query("SELECT 1")
                .execute(conn)
                .map(|_| true)
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn count_stores(&self) -> RepositoryResult<u64> {
        self.with_conn(|conn| {
            let row: CountRow = sql_query(format!(
                "SELECT COUNT(*) AS count FROM ({}) AS fleet",
                FLEET_SUBQUERY
            ))
            .get_result(conn)
            .map_err(|e| map_diesel_error(e).with_operation("count_stores"))?;
            Ok(row.count.max(0) as u64)
        })
        .await
    }

    async fn fetch_store_ids(&self, offset: u64, limit: u64) -> RepositoryResult<Vec<StoreId>> {
        let offset = i64::try_from(offset)
            .map_err(|_| RepositoryError::validation(format!("offset {} too large", offset)))?;
        let limit = i64::try_from(limit)
            .map_err(|_| RepositoryError::validation(format!("limit {} too large", limit)))?;

        self.with_conn(move |conn| {
            let rows: Vec<StoreIdRow> = sql_query(format!(
                "SELECT store_id FROM ({}) AS fleet ORDER BY store_id LIMIT $1 OFFSET $2",
                FLEET_SUBQUERY
            ))
            .bind::<BigInt, _>(limit)
            .bind::<BigInt, _>(offset)
            .load(conn)
            .map_err(|e| map_diesel_error(e).with_operation("fetch_store_ids"))?;
            Ok(rows.into_iter().map(|r| StoreId::new(r.store_id)).collect())
        })
        .await
    }

    async fn fetch_store_details(&self, store_ids: &[StoreId]) -> RepositoryResult<StoreDetails> {
        if store_ids.is_empty() {
            return Ok(StoreDetails::default());
        }
        let ids = raw_ids(store_ids);

        let tz_ids = ids.clone();
        let timezones = self.with_conn(move |conn| {
            let rows: Vec<StoreTimezoneRow> = store_timezones::table
                .filter(store_timezones::store_id.eq_any(&tz_ids))
                .select(StoreTimezoneRow::as_select())
                .load(conn)
                .map_err(|e| map_diesel_error(e).with_operation("fetch_timezones"))?;
            Ok(rows
                .into_iter()
                .map(|r| TimezoneAssignment {
                    store_id: StoreId::new(r.store_id),
                    timezone: r.timezone_str,
                })
                .collect::<Vec<_>>())
        });

        let bh_ids = ids.clone();
        let business_hours = self.with_conn(move |conn| {
            let rows: Vec<BusinessHoursRow> = business_hours::table
                .filter(business_hours::store_id.eq_any(&bh_ids))
                .select(BusinessHoursRow::as_select())
                .load(conn)
                .map_err(|e| map_diesel_error(e).with_operation("fetch_business_hours"))?;
            rows.into_iter().map(row_to_rule).collect::<RepositoryResult<Vec<_>>>()
        });

        let polls = self.with_conn(move |conn| {
            let rows: Vec<StoreStatusRow> = store_status::table
                .filter(store_status::store_id.eq_any(&ids))
                .select(StoreStatusRow::as_select())
                .load(conn)
                .map_err(|e| map_diesel_error(e).with_operation("fetch_polls"))?;
            rows.into_iter().map(row_to_poll).collect::<RepositoryResult<Vec<_>>>()
        });

        let (timezones, business_hours, polls) =
            tokio::try_join!(timezones, business_hours, polls)?;
        Ok(StoreDetails {
            timezones,
            business_hours,
            polls,
        })
    }

    async fn fetch_timezone(&self, store_id: StoreId) -> RepositoryResult<Option<String>> {
        self.with_conn(move |conn| {
            store_timezones::table
                .filter(store_timezones::store_id.eq(store_id.value()))
                .select(store_timezones::timezone_str)
                .first::<String>(conn)
                .optional()
                .map_err(|e| map_diesel_error(e).with_operation("fetch_timezone"))
        })
        .await
    }

    async fn fetch_business_hours(
        &self,
        store_id: StoreId,
    ) -> RepositoryResult<Vec<BusinessHourRule>> {
        self.with_conn(move |conn| {
            let rows: Vec<BusinessHoursRow> = business_hours::table
                .filter(business_hours::store_id.eq(store_id.value()))
                .select(BusinessHoursRow::as_select())
                .load(conn)
                .map_err(|e| map_diesel_error(e).with_operation("fetch_business_hours"))?;
            rows.into_iter().map(row_to_rule).collect()
        })
        .await
    }

    async fn fetch_polls(&self, store_id: StoreId) -> RepositoryResult<Vec<Poll>> {
        self.with_conn(move |conn| {
            let rows: Vec<StoreStatusRow> = store_status::table
                .filter(store_status::store_id.eq(store_id.value()))
                .select(StoreStatusRow::as_select())
                .load(conn)
                .map_err(|e| map_diesel_error(e).with_operation("fetch_polls"))?;
            rows.into_iter().map(row_to_poll).collect()
        })
        .await
    }
}

#[async_trait]
impl ReportRepository for PostgresRepository {
    async fn create_report(&self, report_id: ReportId) -> RepositoryResult<ReportJob> {
        self.with_conn(move |conn| {
            let row: ReportStatusRow = diesel::insert_into(report_status::table)
                .values(&NewReportStatusRow {
                    report_id: report_id.value(),
                    status: ReportStatus::Running.as_str().to_string(),
                    created_at: Utc::now(),
                })
                .returning(ReportStatusRow::as_returning())
                .get_result(conn)
                .map_err(|e| map_diesel_error(e).with_operation("create_report"))?;
            row_to_job(row)
        })
        .await
    }

    async fn get_report(&self, report_id: ReportId) -> RepositoryResult<ReportJob> {
        self.with_conn(move |conn| {
            let row: Option<ReportStatusRow> = report_status::table
                .filter(report_status::report_id.eq(report_id.value()))
                .select(ReportStatusRow::as_select())
                .first(conn)
                .optional()
                .map_err(|e| map_diesel_error(e).with_operation("get_report"))?;
            match row {
                Some(row) => row_to_job(row),
                None => Err(RepositoryError::not_found_with_context(
                    format!("Report {} not found", report_id),
                    ErrorContext::new("get_report")
                        .with_entity("report")
                        .with_entity_id(report_id),
                )),
            }
        })
        .await
    }

    async fn complete_report(&self, report_id: ReportId, result: String) -> RepositoryResult<()> {
        self.with_conn(move |conn| {
            finish_report(
                conn,
                report_id,
                ReportStatus::Complete,
                Some(result),
                "complete_report",
            )
        })
        .await
    }

    async fn fail_report(&self, report_id: ReportId) -> RepositoryResult<()> {
        self.with_conn(move |conn| {
            finish_report(conn, report_id, ReportStatus::Error, None, "fail_report")
        })
        .await
    }
}
