//! Throwaway SQLite databases for integration tests

use std::path::{Path, PathBuf};

use super::TempDir;
use crate::storage::{SqliteConnection, SqlitePool, SqlitePoolConfig, StorageError, StorageResult};

/// Pooled database living in its own temporary directory.
#[derive(Debug)]
pub struct TestDatabase {
    pool: SqlitePool,
    db_path: PathBuf,
    // Dropped last so the file outlives the pool.
    _temp_dir: TempDir,
}

impl TestDatabase {
    pub fn new() -> StorageResult<Self> {
        Self::with_pool_config(SqlitePoolConfig::with_max_size(4))
    }

    pub fn with_pool_config(config: SqlitePoolConfig) -> StorageResult<Self> {
        let temp_dir = TempDir::new("encore-test-db")?;
        let db_path = temp_dir.path().join("encore.db");
        let pool = SqlitePool::new(&db_path, config)?;
        Ok(Self { pool, db_path, _temp_dir: temp_dir })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    pub fn connection(&self) -> StorageResult<SqliteConnection> {
        self.pool.get_connection()
    }

    /// Run a batch of SQL (fixture setup).
    pub fn execute_batch(&self, sql: &str) -> StorageResult<()> {
        self.connection()?.execute_batch(sql).map_err(StorageError::from)
    }
}
