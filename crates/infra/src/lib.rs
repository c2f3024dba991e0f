//! # Encore Infrastructure
//!
//! Infrastructure implementations of core domain ports.
//!
//! This crate contains:
//! - SQLite repositories over the shared connection pool
//! - The Google Calendar provider and its OAuth client
//! - Invitation e-mail and local object storage
//! - Configuration loading and the background calendar scheduler
//!
//! ## Architecture
//! - Implements traits defined in `encore-core`
//! - Depends on `encore-common`, `encore-domain` and `encore-core`
//! - Contains all "impure" code (I/O, HTTP, filesystem)

pub mod config;
pub mod database;
pub mod errors;
pub mod http;
pub mod integrations;
pub mod scheduling;
pub mod storage;

// Re-export commonly used items
pub use database::*;
pub use errors::InfraError;
pub use http::HttpClient;
pub use integrations::*;
pub use scheduling::{CalendarScheduler, CalendarSchedulerConfig, SchedulerError};
pub use storage::LocalObjectStorage;
