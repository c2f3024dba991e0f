//! # Encore Domain
//!
//! Business domain types and models for Encore.
//!
//! This crate contains:
//! - Domain data types (Gig, GigRole, GigReadiness, CalendarConnection, ...)
//! - Domain error types and Result definitions
//! - Configuration structures
//! - Null-safe column mapping helpers and constants
//!
//! ## Architecture
//! - No dependencies on other Encore crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod mapping;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
