//! Store uptime HTTP server binary.
//!
//! Loads the CSV inputs into an in-memory repository, then serves the
//! trigger/poll API.
//!
//! # Usage
//!
//! ```bash
//! DATA_DIR=./data REPORTS_DIR=./reports cargo run --bin store-uptime-server
//! ```
//!
//! # Environment Variables
//!
//! - `HOST`: Server host (default: 0.0.0.0)
//! - `PORT`: Server port (default: 8080)
//! - `DATA_DIR`: Directory holding `store_status.csv`, `menu_hours.csv`, `timezones.csv`
//! - `REPORTS_DIR`: Directory reports are written to (default: reports)
//! - `DEFAULT_TIMEZONE`: Zone for stores without one (default: America/Chicago)
//! - `WORKER_POOL_SIZE`: Stores computed concurrently (default: 8)
//! - `RUST_LOG`: Log filter directives, e.g. `store_uptime=debug,tower_http=info` (default: info)

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use store_uptime::config::Settings;
use store_uptime::db::ingest::ingest_directory;
use store_uptime::db::{CsvReportSink, FullRepository, LocalRepository};
use store_uptime::http::{create_router, AppState};
use store_uptime::services::{MetricsAggregator, ReportService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    FmtSubscriber::builder()
        .with_env_filter(log_filter(std::env::var("RUST_LOG").ok().as_deref()))
        .with_target(true)
        .with_thread_ids(true)
        .init();

    info!("Starting store uptime server");

    let settings = Settings::load()?;
    let resolver = settings.timezone_resolver()?;

    // Load input data before accepting requests
    let repo = LocalRepository::new();
    let data_dir = settings.data.dir.clone();
    let summary = tokio::task::spawn_blocking({
        let repo = repo.clone();
        move || ingest_directory(&repo, &data_dir)
    })
    .await??;
    info!(
        "Loaded {} observations from {}",
        summary.observations,
        settings.data.dir.display()
    );

    let repository: Arc<dyn FullRepository> = Arc::new(repo);
    let aggregator = MetricsAggregator::new(repository.clone(), resolver)
        .with_worker_pool_size(settings.report.worker_pool_size);
    let sink = Arc::new(CsvReportSink::new(settings.report.reports_dir.clone()));
    let reports = ReportService::new(aggregator, sink);

    let app = create_router(AppState::new(repository, reports));

    let addr: SocketAddr = settings.bind_address().parse()?;
    info!("Server listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Filter from `RUST_LOG` directives, falling back to `info` when unset or invalid.
fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}
