//! Report sinks: where finished reports are written.
//!
//! The job layer only sees the [`ReportSink`] trait and stores whatever
//! output location the sink returns.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::models::{ReportId, StoreReport};

#[cfg(feature = "csv")]
use crate::models::REPORT_COLUMNS;
#[cfg(feature = "csv")]
use polars::prelude::*;
#[cfg(feature = "csv")]
use std::path::{Path, PathBuf};

/// Errors raised while persisting a report.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "csv")]
    #[error("CSV error: {0}")]
    Csv(#[from] PolarsError),

    #[error("Sink task failed: {0}")]
    Task(String),

    #[error("Sink unavailable: {0}")]
    Unavailable(String),
}

/// Destination for completed reports.
#[async_trait]
pub trait ReportSink: Send + Sync {
    /// Persist `rows` for `report_id` and return where they were written.
    async fn write_report(
        &self,
        report_id: &ReportId,
        rows: &[StoreReport],
    ) -> Result<String, SinkError>;
}

/// Keeps reports in memory, keyed by report id.
#[derive(Default)]
pub struct InMemorySink {
    reports: Mutex<HashMap<ReportId, Vec<StoreReport>>>,
    fail_writes: AtomicBool,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent writes fail, for exercising the Failed path.
    pub fn set_failing(&self, failing: bool) {
        self.fail_writes.store(failing, Ordering::SeqCst);
    }

    /// Rows written for `report_id`.
    pub fn rows(&self, report_id: &ReportId) -> Option<Vec<StoreReport>> {
        self.reports.lock().get(report_id).cloned()
    }

    pub fn report_count(&self) -> usize {
        self.reports.lock().len()
    }
}

#[async_trait]
impl ReportSink for InMemorySink {
    async fn write_report(
        &self,
        report_id: &ReportId,
        rows: &[StoreReport],
    ) -> Result<String, SinkError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(SinkError::Unavailable("in-memory sink set to fail".to_string()));
        }
        self.reports.lock().insert(report_id.clone(), rows.to_vec());
        Ok(format!("memory://{}", report_id))
    }
}

/// Writes `store_report_<report_id>.csv` files into a directory.
#[cfg(feature = "csv")]
#[derive(Debug, Clone)]
pub struct CsvReportSink {
    dir: PathBuf,
}

#[cfg(feature = "csv")]
impl CsvReportSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File the report with `report_id` is written to.
    pub fn path_for(&self, report_id: &ReportId) -> PathBuf {
        self.dir.join(format!("store_report_{}.csv", report_id))
    }
}

#[cfg(feature = "csv")]
#[async_trait]
impl ReportSink for CsvReportSink {
    async fn write_report(
        &self,
        report_id: &ReportId,
        rows: &[StoreReport],
    ) -> Result<String, SinkError> {
        let path = self.path_for(report_id);
        let rows = rows.to_vec();

        let written = tokio::task::spawn_blocking(move || write_csv(&path, &rows).map(|_| path))
            .await
            .map_err(|e| SinkError::Task(e.to_string()))??;

        log::info!("Report {} written to {}", report_id, written.display());
        Ok(written.display().to_string())
    }
}

#[cfg(feature = "csv")]
fn write_csv(path: &Path, rows: &[StoreReport]) -> Result<(), SinkError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let ids: Vec<String> = rows.iter().map(|r| r.store_id.to_string()).collect();
    let column = |idx: usize| -> Vec<f64> { rows.iter().map(|r| r.values()[idx]).collect() };

    let mut df = df!(
        REPORT_COLUMNS[0] => ids,
        REPORT_COLUMNS[1] => column(0),
        REPORT_COLUMNS[2] => column(1),
        REPORT_COLUMNS[3] => column(2),
        REPORT_COLUMNS[4] => column(3),
        REPORT_COLUMNS[5] => column(4),
        REPORT_COLUMNS[6] => column(5)
    )?;

    let mut file = std::fs::File::create(path)?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut df)?;
    Ok(())
}
