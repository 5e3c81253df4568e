//! # Store Uptime Backend
//!
//! Estimates how long each store was up or down during its business hours
//! over the last hour, day and week, from sparse status polls.
//!
//! ## Features
//!
//! - **Interpolation**: forward-filled step function of polls, clipped to
//!   business hours in the store's own timezone
//! - **Batch reports**: every observed store computed on a bounded worker pool,
//!   with per-store failure isolation
//! - **Async jobs**: trigger a report, poll until it is complete
//! - **CSV ingestion and output** (feature `csv`)
//! - **HTTP API** (feature `http-server`)
//!
//! ## Architecture
//!
//! - [`models`]: Value types, business-hours calendar, timelines, timezones
//! - [`db`]: Repository traits, in-memory repository, CSV ingestion, report sinks
//! - [`services`]: Interpolator, aggregator, validation, job lifecycle
//! - [`config`]: Settings from `uptime.toml` and the environment
//! - [`http`]: Axum-based HTTP server and request handlers
//! - [`api`]: Re-exports of the public surface

// Allow large error types - RepositoryError contains rich context for debugging
#![allow(clippy::result_large_err)]

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod services;

#[cfg(feature = "http-server")]
pub mod http;
