//! HTTP handlers for the REST API.
//!
//! Each handler corresponds to an API endpoint and delegates to the
//! report services.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use chrono::Utc;

use super::dto::{GetReportRequest, HealthResponse, ReportStatusResponse, TriggerReportResponse};
use super::error::AppError;
use super::state::AppState;
use crate::db::services as db_services;
use crate::models::{ReportId, StoreId, UptimeRecord};
use crate::services::reports;

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

/// GET /health
///
/// Health check endpoint to verify the service is running and database is accessible.
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let db_status = match db_services::health_check(state.repository.as_ref()).await {
        Ok(true) => "connected".to_string(),
        Ok(false) => "disconnected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: db_status,
    }))
}

/// POST /trigger_report
///
/// Create a report job and return its id without waiting for the computation.
pub async fn trigger_report(State(state): State<AppState>) -> HandlerResult<TriggerReportResponse> {
    let report_id = reports::trigger_report(&state.pipeline).await?;
    tracing::info!(%report_id, "report triggered");

    Ok(Json(TriggerReportResponse {
        report_id: report_id.to_string(),
    }))
}

/// GET /get_report
///
/// Report status for the job named in the JSON body.
pub async fn get_report(
    State(state): State<AppState>,
    body: Result<Json<GetReportRequest>, JsonRejection>,
) -> HandlerResult<ReportStatusResponse> {
    let Json(request) = body?;
    let report_id: ReportId = request.report_id.parse().map_err(|e| {
        AppError::BadRequest(format!("Invalid report_id '{}': {}", request.report_id, e))
    })?;

    let outcome = reports::get_report(state.repository.as_ref(), report_id).await?;
    Ok(Json(outcome.into()))
}

/// GET /stores/{store_id}/uptime
///
/// Uptime for a single location as of now, computed on demand.
pub async fn get_store_uptime(
    State(state): State<AppState>,
    Path(store_id): Path<String>,
) -> HandlerResult<UptimeRecord> {
    let store_id: StoreId = store_id
        .parse()
        .map_err(|e| AppError::BadRequest(format!("Invalid store_id '{}': {}", store_id, e)))?;

    reports::store_uptime(
        state.repository.as_ref(),
        state.report_config(),
        store_id,
        Utc::now(),
    )
    .await?
    .map(Json)
    .ok_or_else(|| AppError::NotFound(format!("Store {} not found", store_id)))
}
