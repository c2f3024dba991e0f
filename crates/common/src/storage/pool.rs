//! SQLite connection pool
//!
//! r2d2-based pooling with per-connection pragmas and acquisition metrics.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use tracing::{debug, info, instrument, warn};

use super::config::SqlitePoolConfig;
use super::connection::SqliteConnection;
use super::error::{StorageError, StorageResult};
use super::metrics::StorageMetrics;
use super::pragmas::apply_connection_pragmas;

/// Pool health snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthStatus {
    pub healthy: bool,
    pub connections: u32,
    pub idle_connections: u32,
    pub max_size: u32,
    pub message: Option<String>,
}

#[derive(Debug)]
pub struct SqlitePool {
    pool: Pool<SqliteConnectionManager>,
    config: SqlitePoolConfig,
    metrics: Arc<StorageMetrics>,
}

impl SqlitePool {
    /// Open (or create) the database file and build the pool.
    ///
    /// One connection is checked out immediately so a bad path fails here
    /// rather than on the first request.
    #[instrument(fields(db_path = ?path, pool_size = config.max_size))]
    pub fn new(path: &Path, config: SqlitePoolConfig) -> StorageResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let metrics = Arc::new(StorageMetrics::new(config.max_size));
        let pragma_config = config.clone();

        let manager = SqliteConnectionManager::file(path).with_init(move |conn| {
            apply_connection_pragmas(conn, &pragma_config)
                .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
        });

        let pool = Pool::builder()
            .max_size(config.max_size)
            .connection_timeout(config.connection_timeout)
            .build(manager)
            .map_err(|e| {
                warn!("Failed to create connection pool: {}", e);
                StorageError::Connection(format!("Failed to create pool: {e}"))
            })?;

        {
            let _probe = pool.get().map_err(|e| {
                StorageError::Connection(format!("Failed to get test connection: {e}"))
            })?;
            debug!("Initial connection verified");
        }

        info!("SQLite pool created with {} connections", config.max_size);
        Ok(Self { pool, config, metrics })
    }

    /// Check a connection out of the pool.
    #[instrument(skip(self), fields(pool_size = self.config.max_size))]
    pub fn get_connection(&self) -> StorageResult<SqliteConnection> {
        let start = Instant::now();

        match self.pool.get() {
            Ok(conn) => {
                let duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
                self.metrics.record_connection_acquired(duration_ms);
                Ok(SqliteConnection::new(conn))
            }
            Err(e) => {
                if e.to_string().to_lowercase().contains("timed out") {
                    self.metrics.record_connection_timeout();
                    warn!("Connection timeout after {:?}", self.config.connection_timeout);
                    Err(StorageError::Timeout(self.config.connection_timeout.as_secs()))
                } else {
                    self.metrics.record_connection_error();
                    warn!("Connection error: {}", e);
                    Err(StorageError::Connection(format!("Failed to get connection: {e}")))
                }
            }
        }
    }

    pub fn health_check(&self) -> HealthStatus {
        let state = self.pool.state();
        match self.pool.get() {
            Ok(_conn) => HealthStatus {
                healthy: true,
                connections: state.connections,
                idle_connections: state.idle_connections,
                max_size: self.config.max_size,
                message: None,
            },
            Err(e) => HealthStatus {
                healthy: false,
                connections: state.connections,
                idle_connections: state.idle_connections,
                max_size: self.config.max_size,
                message: Some(format!("Pool unhealthy: {e}")),
            },
        }
    }

    pub fn metrics(&self) -> &Arc<StorageMetrics> {
        &self.metrics
    }

    pub fn config(&self) -> &SqlitePoolConfig {
        &self.config
    }
}
