use chrono::{DateTime, NaiveDateTime, NaiveTime, Utc};
use diesel::prelude::*;
use diesel::sql_types::BigInt;
use uuid::Uuid;

use super::schema::{business_hours, report_status, store_status, store_timezones};

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = store_status)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct StoreStatusRow {
    pub store_id: i64,
    pub timestamp_utc: NaiveDateTime,
    pub status: String,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = business_hours)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct BusinessHoursRow {
    pub store_id: i64,
    pub day_of_week: i32,
    pub start_time_local: NaiveTime,
    pub end_time_local: NaiveTime,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = store_timezones)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct StoreTimezoneRow {
    pub store_id: i64,
    pub timezone_str: String,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = report_status)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ReportStatusRow {
    pub report_id: Uuid,
    pub status: String,
    pub result: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = report_status)]
pub struct NewReportStatusRow {
    pub report_id: Uuid,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// Row shape for raw fleet paging queries.
#[derive(Debug, Clone, QueryableByName)]
pub struct StoreIdRow {
    #[diesel(sql_type = BigInt)]
    pub store_id: i64,
}

/// Row shape for raw fleet count queries.
#[derive(Debug, Clone, QueryableByName)]
pub struct CountRow {
    #[diesel(sql_type = BigInt)]
    pub count: i64,
}
