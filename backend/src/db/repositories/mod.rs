//! Repository implementations.
//!
//! - `local`: In-memory implementation, loaded from CSV at startup or seeded by tests
pub mod local;

pub use local::LocalRepository;
