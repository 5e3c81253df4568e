//! Storage for poll observations and store configuration.
//!
//! Reads go through the repository traits so the report pipeline never
//! depends on a concrete backend:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Services (aggregator, report jobs)                     │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Repository traits (repository/) - Abstract Interface   │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//!     ┌───────────────▼──────────────────────────────┐
//!     │  LocalRepository (in-memory, CSV-loaded)     │
//!     └──────────────────────────────────────────────┘
//! ```
//!
//! - `repository`: trait definitions and errors
//! - `repositories::local`: in-memory implementation
//! - `ingest`: CSV loading (feature `csv`)
//! - `sink`: report destinations

#[cfg(feature = "csv")]
pub mod ingest;
pub mod repositories;
pub mod repository;
pub mod sink;

pub use repositories::LocalRepository;
pub use repository::{
    ErrorContext, FullRepository, RepositoryError, RepositoryResult, StatusRepository,
    StoreConfigRepository,
};
#[cfg(feature = "csv")]
pub use sink::CsvReportSink;
pub use sink::{InMemorySink, ReportSink, SinkError};
