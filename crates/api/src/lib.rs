//! # Encore API
//!
//! HTTP application layer - routes and main entry point.
//!
//! This crate contains:
//! - axum route handlers (HTTP → services bridge)
//! - Application context (dependency injection)
//! - Main entry point and setup
//!
//! ## Architecture
//! - Depends on `common`, `domain`, `core`, and `infra`
//! - Wires up the hexagonal architecture
//! - The acting user arrives in the `x-user-id` header from the gateway

pub mod commands;
pub mod context;
pub mod error;
pub mod extract;
pub mod utils;

// Re-export for convenience
pub use commands::router;
pub use context::AppContext;
pub use error::{ApiError, ApiResult};
pub use extract::{CurrentUser, USER_ID_HEADER};
