//! Data Transfer Objects for the HTTP API.

use serde::{Deserialize, Serialize};

use crate::models::{ReportId, ReportStatus, ValidationWarning};

/// Response for `POST /api/v1/trigger_report`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerReportResponse {
    pub report_id: ReportId,
}

/// Query string of `GET /api/v1/get_report`.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportQuery {
    pub report_id: ReportId,
}

/// JSON status of a report that is not served as a file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportStatusResponse {
    pub status: ReportStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<ValidationWarning>,
}

impl ReportStatusResponse {
    pub fn running() -> Self {
        Self {
            status: ReportStatus::Running,
            output_location: None,
            error: None,
            diagnostics: vec![],
        }
    }

    pub fn complete(output_location: String, diagnostics: Vec<ValidationWarning>) -> Self {
        Self {
            status: ReportStatus::Complete,
            output_location: Some(output_location),
            error: None,
            diagnostics,
        }
    }

    pub fn failed(error: String) -> Self {
        Self {
            status: ReportStatus::Failed,
            output_location: None,
            error: Some(error),
            diagnostics: vec![],
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: String,
}
