//! Report job lifecycle: trigger, background generation, polling.
//!
//! ```text
//!  trigger_report ──► Running ──► generate ──► write ──► Complete
//!                                    │            │
//!                                    └────────────┴────► Failed
//! ```
//!
//! Generation runs as a detached tokio task. There is no dedup, cancellation
//! or retry: every trigger is an independent job.

use std::sync::Arc;

use crate::db::sink::ReportSink;
use crate::models::{ReportId, ReportStatus, ValidationWarning};
use crate::services::job_tracker::{JobTracker, ReportJob};
use crate::services::metrics_aggregator::MetricsAggregator;

/// Errors returned by [`ReportService::trigger_report`].
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Cannot schedule report generation: {0}")]
    Scheduling(String),
}

/// Answer to a poll.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportPoll {
    Running,
    Complete {
        output_location: String,
        diagnostics: Vec<ValidationWarning>,
    },
    Failed {
        error_message: String,
    },
    NotFound,
}

impl From<ReportJob> for ReportPoll {
    fn from(job: ReportJob) -> Self {
        match job.status {
            ReportStatus::Running => ReportPoll::Running,
            ReportStatus::Complete => ReportPoll::Complete {
                output_location: job.output_location.unwrap_or_default(),
                diagnostics: job.diagnostics,
            },
            ReportStatus::Failed => ReportPoll::Failed {
                error_message: job.error_message.unwrap_or_default(),
            },
        }
    }
}

/// Owns report jobs and drives their generation.
#[derive(Clone)]
pub struct ReportService {
    aggregator: MetricsAggregator,
    sink: Arc<dyn ReportSink>,
    tracker: JobTracker,
}

impl ReportService {
    pub fn new(aggregator: MetricsAggregator, sink: Arc<dyn ReportSink>) -> Self {
        Self {
            aggregator,
            sink,
            tracker: JobTracker::new(),
        }
    }

    pub fn tracker(&self) -> &JobTracker {
        &self.tracker
    }

    /// Start a new report and return its id without waiting for it.
    ///
    /// Fails only when no tokio runtime is available to run the job.
    pub fn trigger_report(&self) -> Result<ReportId, ReportError> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| ReportError::Scheduling(e.to_string()))?;

        let report_id = self.tracker.create_job();
        log::info!("Report {} triggered", report_id);

        let service = self.clone();
        let job_id = report_id.clone();
        runtime.spawn(async move {
            let worker = tokio::spawn({
                let service = service.clone();
                let job_id = job_id.clone();
                async move { service.run_report(&job_id).await }
            });
            // A panic in generation must still leave the job terminal
            if let Err(join_err) = worker.await {
                log::error!("Report {} task aborted: {}", job_id, join_err);
                service
                    .tracker
                    .fail_job(&job_id, format!("Report generation aborted: {}", join_err));
            }
        });

        Ok(report_id)
    }

    /// Generate and write the report for an already created job.
    ///
    /// Records the terminal state on the tracker and returns it.
    pub async fn run_report(&self, report_id: &ReportId) -> ReportStatus {
        let outcome = match self.aggregator.generate().await {
            Ok(outcome) => outcome,
            Err(e) => {
                log::error!("Report {} failed: {}", report_id, e);
                self.tracker.fail_job(report_id, e.to_string());
                return ReportStatus::Failed;
            }
        };

        match self.sink.write_report(report_id, &outcome.rows).await {
            Ok(location) => {
                log::info!(
                    "Report {} complete: {} rows as of {}",
                    report_id,
                    outcome.rows.len(),
                    outcome.as_of
                );
                self.tracker
                    .complete_job(report_id, location, outcome.diagnostics);
                ReportStatus::Complete
            }
            Err(e) => {
                log::error!("Report {} could not be written: {}", report_id, e);
                self.tracker
                    .fail_job(report_id, format!("Failed to write report: {}", e));
                ReportStatus::Failed
            }
        }
    }

    /// Current state of `report_id`. Pure read.
    pub fn poll_report(&self, report_id: &ReportId) -> ReportPoll {
        self.tracker
            .get_job(report_id)
            .map(ReportPoll::from)
            .unwrap_or(ReportPoll::NotFound)
    }
}

#[cfg(test)]
#[path = "report_service_tests.rs"]
mod report_service_tests;
