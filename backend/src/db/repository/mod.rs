//! Repository trait definitions for store data.
//!
//! Reads are split across two focused traits so tests and alternative
//! backends can implement only what they need.
//!
//! # Module Organization
//!
//! - [`error`]: Error types for repository operations
//! - [`status`]: Poll observations and the store universe
//! - [`store_config`]: Per-store business hours and timezone assignments
//!
//! # Convenience Trait Bound
//!
//! Code that needs every read uses the [`FullRepository`] bound:
//!
//! ```ignore
//! async fn latest<R: FullRepository + ?Sized>(repo: &R) -> RepositoryResult<()> {
//!     let as_of = repo.max_observation_timestamp().await?;
//!     let stores = repo.distinct_store_ids().await?;
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod status;
pub mod store_config;

pub use error::{ErrorContext, RepositoryError, RepositoryResult};

pub use status::StatusRepository;
pub use store_config::StoreConfigRepository;

/// Composite trait bound for a complete repository implementation.
///
/// Automatically implemented for any type that implements both traits.
pub trait FullRepository: StatusRepository + StoreConfigRepository {}

impl<T> FullRepository for T where T: StatusRepository + StoreConfigRepository {}
