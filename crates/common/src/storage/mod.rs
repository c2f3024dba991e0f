//! Pooled SQLite storage
//!
//! r2d2 pool over rusqlite with WAL/foreign-key pragmas applied to every
//! connection, plus lightweight acquisition metrics.

pub mod config;
pub mod connection;
pub mod error;
pub mod metrics;
pub mod pool;
pub mod pragmas;

pub use config::SqlitePoolConfig;
pub use connection::{SqliteConnection, SqliteStatement};
pub use error::{StorageError, StorageResult};
pub use metrics::StorageMetrics;
pub use pool::{HealthStatus, SqlitePool};
pub use pragmas::apply_connection_pragmas;
