//! HTTP handlers for the REST API.
//!
//! Handlers are thin: they delegate to [`ReportService`](crate::services::ReportService)
//! and map its answers onto HTTP.

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use super::dto::{HealthResponse, ReportQuery, ReportStatusResponse, TriggerReportResponse};
use super::error::AppError;
use super::state::AppState;
use crate::models::ReportId;
use crate::services::ReportPoll;

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
///
/// Health check endpoint to verify the service is running and the repository is reachable.
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let db_status = match state.repository.health_check().await {
        Ok(true) => "connected".to_string(),
        Ok(false) => "disconnected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: "v1".to_string(),
        database: db_status,
    }))
}

// =============================================================================
// Reports
// =============================================================================

/// POST /api/v1/trigger_report
///
/// Start a report in the background and return its id immediately.
pub async fn trigger_report(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<TriggerReportResponse>), AppError> {
    let report_id = state.reports.trigger_report()?;
    Ok((StatusCode::ACCEPTED, Json(TriggerReportResponse { report_id })))
}

/// GET /api/v1/get_report?report_id=...
///
/// Running and Failed answer with JSON. Complete answers with the CSV file
/// when the output location is a readable file, otherwise with JSON.
pub async fn get_report(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> Result<Response, AppError> {
    match state.reports.poll_report(&query.report_id) {
        ReportPoll::NotFound => Err(AppError::NotFound(format!(
            "Report {} not found",
            query.report_id
        ))),
        ReportPoll::Running => Ok(Json(ReportStatusResponse::running()).into_response()),
        ReportPoll::Failed { error_message } => {
            Ok(Json(ReportStatusResponse::failed(error_message)).into_response())
        }
        ReportPoll::Complete {
            output_location,
            diagnostics,
        } => match tokio::fs::read(&output_location).await {
            Ok(bytes) => Ok(csv_attachment(&query.report_id, bytes)),
            Err(_) => Ok(
                Json(ReportStatusResponse::complete(output_location, diagnostics)).into_response(),
            ),
        },
    }
}

fn csv_attachment(report_id: &ReportId, bytes: Vec<u8>) -> Response {
    let disposition = format!("attachment; filename=\"store_report_{}.csv\"", report_id);
    (
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response()
}
