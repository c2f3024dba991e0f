//! Pooled SQLite connection wrapper

use std::ops::{Deref, DerefMut};

use r2d2::PooledConnection;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection as RusqliteConnection, Row, Statement as RusqliteStatement, ToSql};
use tracing::instrument;

use super::error::{StorageError, StorageResult};

/// Pooled connection, returned to the pool on drop.
///
/// Derefs to [`rusqlite::Connection`] for anything the wrapper does not cover
/// (`execute_batch`, `transaction`).
pub struct SqliteConnection {
    inner: PooledConnection<SqliteConnectionManager>,
}

impl SqliteConnection {
    pub fn new(conn: PooledConnection<SqliteConnectionManager>) -> Self {
        Self { inner: conn }
    }

    /// Execute a query that returns a single row.
    #[instrument(skip(self, params, f), fields(sql = %sql))]
    pub fn query_row<T, F>(&self, sql: &str, params: &[&dyn ToSql], f: F) -> StorageResult<T>
    where
        F: FnOnce(&Row<'_>) -> Result<T, rusqlite::Error>,
    {
        self.inner.query_row(sql, params, f).map_err(StorageError::from)
    }

    /// Like [`query_row`](Self::query_row) but maps "no rows" to `None`.
    pub fn query_optional<T, F>(
        &self,
        sql: &str,
        params: &[&dyn ToSql],
        f: F,
    ) -> StorageResult<Option<T>>
    where
        F: FnOnce(&Row<'_>) -> Result<T, rusqlite::Error>,
    {
        match self.inner.query_row(sql, params, f) {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(err) => Err(StorageError::from(err)),
        }
    }

    #[instrument(skip(self, params), fields(sql = %sql))]
    pub fn execute(&self, sql: &str, params: &[&dyn ToSql]) -> StorageResult<usize> {
        self.inner.execute(sql, params).map_err(StorageError::from)
    }

    #[instrument(skip(self), fields(sql = %sql))]
    pub fn prepare(&self, sql: &str) -> StorageResult<SqliteStatement<'_>> {
        let stmt = self.inner.prepare(sql).map_err(StorageError::from)?;
        Ok(SqliteStatement { inner: stmt })
    }
}

impl Deref for SqliteConnection {
    type Target = RusqliteConnection;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for SqliteConnection {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}

/// Prepared statement wrapper
pub struct SqliteStatement<'conn> {
    inner: RusqliteStatement<'conn>,
}

impl SqliteStatement<'_> {
    pub fn execute(&mut self, params: &[&dyn ToSql]) -> StorageResult<usize> {
        self.inner.execute(params).map_err(StorageError::from)
    }

    /// Run the query and collect every mapped row.
    pub fn query_map<T, F>(&mut self, params: &[&dyn ToSql], mut f: F) -> StorageResult<Vec<T>>
    where
        F: FnMut(&Row<'_>) -> Result<T, rusqlite::Error>,
    {
        let rows = self.inner.query_map(params, |row| f(row)).map_err(StorageError::from)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(StorageError::from)
    }
}

#[cfg(test)]
mod tests {
    use rusqlite::params;
    use tempfile::TempDir;

    use crate::storage::{SqlitePool, SqlitePoolConfig};

    #[test]
    fn query_helpers_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let pool =
            SqlitePool::new(&temp_dir.path().join("conn.db"), SqlitePoolConfig::default()).unwrap();
        let conn = pool.get_connection().unwrap();

        conn.execute_batch("CREATE TABLE songs (id INTEGER PRIMARY KEY, title TEXT NOT NULL)")
            .unwrap();
        conn.execute("INSERT INTO songs (title) VALUES (?1)", params!["So What"]).unwrap();
        conn.execute("INSERT INTO songs (title) VALUES (?1)", params!["Blue in Green"]).unwrap();

        let mut stmt = conn.prepare("SELECT title FROM songs ORDER BY id").unwrap();
        let titles: Vec<String> = stmt.query_map(params![], |row| row.get(0)).unwrap();
        assert_eq!(titles, vec!["So What", "Blue in Green"]);

        let missing: Option<String> = conn
            .query_optional("SELECT title FROM songs WHERE id = ?1", params![99], |row| row.get(0))
            .unwrap();
        assert!(missing.is_none());
    }
}
