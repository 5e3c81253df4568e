//! Job tracking for background report generation.
//!
//! A simple in-memory tracker. Each job is written when it is created and
//! once more when its owning task reaches a terminal state. Terminal jobs are
//! never updated again.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::models::{ReportId, ReportStatus, ValidationWarning};

/// Job metadata and outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportJob {
    pub report_id: ReportId,
    pub status: ReportStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Where the finished report was written.
    pub output_location: Option<String>,
    pub error_message: Option<String>,
    pub diagnostics: Vec<ValidationWarning>,
}

/// In-memory job tracker.
#[derive(Clone, Default)]
pub struct JobTracker {
    jobs: Arc<RwLock<HashMap<ReportId, ReportJob>>>,
}

impl JobTracker {
    /// Create a new job tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new Running job and return its ID.
    pub fn create_job(&self) -> ReportId {
        let report_id = ReportId::generate();
        let now = Utc::now();
        let job = ReportJob {
            report_id: report_id.clone(),
            status: ReportStatus::Running,
            created_at: now,
            updated_at: now,
            output_location: None,
            error_message: None,
            diagnostics: vec![],
        };
        self.jobs.write().insert(report_id.clone(), job);
        report_id
    }

    /// Mark a Running job as complete.
    pub fn complete_job(
        &self,
        report_id: &ReportId,
        output_location: impl Into<String>,
        diagnostics: Vec<ValidationWarning>,
    ) {
        let mut jobs = self.jobs.write();
        if let Some(job) = running_job(&mut jobs, report_id, ReportStatus::Complete) {
            job.status = ReportStatus::Complete;
            job.updated_at = Utc::now();
            job.output_location = Some(output_location.into());
            job.diagnostics = diagnostics;
        }
    }

    /// Mark a Running job as failed.
    pub fn fail_job(&self, report_id: &ReportId, error_message: impl Into<String>) {
        let mut jobs = self.jobs.write();
        if let Some(job) = running_job(&mut jobs, report_id, ReportStatus::Failed) {
            job.status = ReportStatus::Failed;
            job.updated_at = Utc::now();
            job.error_message = Some(error_message.into());
        }
    }

    /// Get a job by ID.
    pub fn get_job(&self, report_id: &ReportId) -> Option<ReportJob> {
        self.jobs.read().get(report_id).cloned()
    }

    pub fn job_count(&self) -> usize {
        self.jobs.read().len()
    }
}

fn running_job<'a>(
    jobs: &'a mut HashMap<ReportId, ReportJob>,
    report_id: &ReportId,
    target: ReportStatus,
) -> Option<&'a mut ReportJob> {
    let job = jobs.get_mut(report_id)?;
    if job.status.is_terminal() {
        log::warn!(
            "Ignoring transition of report {} from {} to {}",
            report_id,
            job.status,
            target
        );
        return None;
    }
    Some(job)
}
