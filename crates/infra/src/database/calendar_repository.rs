//! Calendar connection and sync-log persistence

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use encore_core::{CalendarConnectionRepository, SyncLogRepository};
use encore_domain::{
    mapping, CalendarConnection, Result as DomainResult, SyncAction, SyncDirection, SyncLogEntry,
    SyncStatus,
};
use rusqlite::{params, Row, ToSql};

use super::manager::{map_storage_error, run_blocking, DbManager};

const CONNECTION_COLUMNS: &str = "id, user_id, provider, access_token, refresh_token, expires_at, \
     calendar_id, provider_email, sync_enabled, last_synced_at, watch_channel_id, \
     watch_resource_id, watch_expires_at, created_at, updated_at";

/// SQLite-backed implementation of `CalendarConnectionRepository`
pub struct SqliteCalendarConnectionRepository {
    db: Arc<DbManager>,
}

impl SqliteCalendarConnectionRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }

    async fn select_many(
        &self,
        filter: &'static str,
        param: Option<DateTime<Utc>>,
    ) -> DomainResult<Vec<CalendarConnection>> {
        run_blocking(&self.db, move |conn| {
            let sql = format!(
                "SELECT {CONNECTION_COLUMNS} FROM calendar_connections WHERE {filter}
                 ORDER BY updated_at ASC"
            );
            let mut stmt = conn.prepare(&sql).map_err(map_storage_error)?;
            match param {
                Some(value) => stmt.query_map(params![value], map_connection_row),
                None => stmt.query_map(params![], map_connection_row),
            }
            .map_err(map_storage_error)
        })
        .await
    }
}

#[async_trait]
impl CalendarConnectionRepository for SqliteCalendarConnectionRepository {
    async fn find(
        &self,
        user_id: &str,
        provider: &str,
    ) -> DomainResult<Option<CalendarConnection>> {
        let user_id = user_id.to_string();
        let provider = provider.to_string();
        run_blocking(&self.db, move |conn| {
            let sql = format!(
                "SELECT {CONNECTION_COLUMNS} FROM calendar_connections
                 WHERE user_id = ?1 AND provider = ?2"
            );
            conn.query_optional(&sql, params![user_id, provider], map_connection_row)
                .map_err(map_storage_error)
        })
        .await
    }

    async fn upsert(&self, connection: &CalendarConnection) -> DomainResult<()> {
        let c = connection.clone();
        run_blocking(&self.db, move |conn| {
            let params: [&dyn ToSql; 15] = [
                &c.id,
                &c.user_id,
                &c.provider,
                &c.access_token,
                &c.refresh_token,
                &c.expires_at,
                &c.calendar_id,
                &c.provider_email,
                &i64::from(c.sync_enabled),
                &c.last_synced_at,
                &c.watch_channel_id,
                &c.watch_resource_id,
                &c.watch_expires_at,
                &c.created_at,
                &c.updated_at,
            ];
            let sql = format!(
                "INSERT INTO calendar_connections ({CONNECTION_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
                 ON CONFLICT (user_id, provider) DO UPDATE SET
                    access_token = excluded.access_token,
                    refresh_token = excluded.refresh_token,
                    expires_at = excluded.expires_at,
                    calendar_id = excluded.calendar_id,
                    provider_email = excluded.provider_email,
                    sync_enabled = excluded.sync_enabled,
                    last_synced_at = excluded.last_synced_at,
                    watch_channel_id = excluded.watch_channel_id,
                    watch_resource_id = excluded.watch_resource_id,
                    watch_expires_at = excluded.watch_expires_at,
                    updated_at = excluded.updated_at"
            );
            conn.execute(&sql, params.as_slice()).map_err(map_storage_error)?;
            Ok(())
        })
        .await
    }

    async fn delete(&self, user_id: &str, provider: &str) -> DomainResult<bool> {
        let user_id = user_id.to_string();
        let provider = provider.to_string();
        run_blocking(&self.db, move |conn| {
            let deleted = conn
                .execute(
                    "DELETE FROM calendar_connections WHERE user_id = ?1 AND provider = ?2",
                    params![user_id, provider],
                )
                .map_err(map_storage_error)?;
            Ok(deleted > 0)
        })
        .await
    }

    async fn find_by_watch_channel(
        &self,
        channel_id: &str,
    ) -> DomainResult<Option<CalendarConnection>> {
        let channel_id = channel_id.to_string();
        run_blocking(&self.db, move |conn| {
            let sql = format!(
                "SELECT {CONNECTION_COLUMNS} FROM calendar_connections WHERE watch_channel_id = ?1"
            );
            conn.query_optional(&sql, params![channel_id], map_connection_row)
                .map_err(map_storage_error)
        })
        .await
    }

    async fn list_with_expiring_watch(
        &self,
        before: DateTime<Utc>,
    ) -> DomainResult<Vec<CalendarConnection>> {
        self.select_many(
            "sync_enabled = 1 AND (watch_expires_at IS NULL OR watch_expires_at < ?1)",
            Some(before),
        )
        .await
    }

    async fn list_sync_enabled(&self) -> DomainResult<Vec<CalendarConnection>> {
        self.select_many("sync_enabled = 1", None).await
    }
}

fn map_connection_row(row: &Row<'_>) -> rusqlite::Result<CalendarConnection> {
    Ok(CalendarConnection {
        id: row.get(0)?,
        user_id: row.get(1)?,
        provider: row.get(2)?,
        access_token: row.get(3)?,
        refresh_token: mapping::non_empty(row.get(4)?),
        expires_at: row.get(5)?,
        calendar_id: mapping::calendar_id(row.get(6)?),
        provider_email: row.get(7)?,
        sync_enabled: mapping::flag(row.get(8)?),
        last_synced_at: row.get(9)?,
        watch_channel_id: row.get(10)?,
        watch_resource_id: row.get(11)?,
        watch_expires_at: row.get(12)?,
        created_at: row.get(13)?,
        updated_at: row.get(14)?,
    })
}

// =============================================================================
// Sync Log
// =============================================================================

/// SQLite-backed implementation of `SyncLogRepository`
pub struct SqliteSyncLogRepository {
    db: Arc<DbManager>,
}

impl SqliteSyncLogRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SyncLogRepository for SqliteSyncLogRepository {
    async fn insert(&self, entry: &SyncLogEntry) -> DomainResult<()> {
        let e = entry.clone();
        run_blocking(&self.db, move |conn| {
            conn.execute(
                "INSERT INTO calendar_sync_log (id, user_id, gig_id, direction, action, status,
                    external_event_id, error_message, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    e.id,
                    e.user_id,
                    e.gig_id,
                    e.direction.as_str(),
                    e.action.as_str(),
                    e.status.as_str(),
                    e.external_event_id,
                    e.error_message,
                    e.created_at,
                ],
            )
            .map_err(map_storage_error)?;
            Ok(())
        })
        .await
    }

    async fn list_for_user(&self, user_id: &str, limit: u32) -> DomainResult<Vec<SyncLogEntry>> {
        let user_id = user_id.to_string();
        run_blocking(&self.db, move |conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, user_id, gig_id, direction, action, status, external_event_id,
                        error_message, created_at
                     FROM calendar_sync_log WHERE user_id = ?1
                     ORDER BY created_at DESC, id DESC LIMIT ?2",
                )
                .map_err(map_storage_error)?;
            let rows =
                stmt.query_map(params![user_id, limit], map_sync_row).map_err(map_storage_error)?;
            Ok(rows.into_iter().flatten().collect())
        })
        .await
    }
}

/// Rows whose action or direction text is unknown are dropped.
fn map_sync_row(row: &Row<'_>) -> rusqlite::Result<Option<SyncLogEntry>> {
    let direction: String = row.get(3)?;
    let action: String = row.get(4)?;
    let (Ok(direction), Ok(action)) =
        (direction.parse::<SyncDirection>(), action.parse::<SyncAction>())
    else {
        return Ok(None);
    };
    Ok(Some(SyncLogEntry {
        id: row.get(0)?,
        user_id: row.get(1)?,
        gig_id: row.get(2)?,
        direction,
        action,
        status: mapping::status_or(row.get(5)?, SyncStatus::Failed),
        external_event_id: row.get(6)?,
        error_message: row.get(7)?,
        created_at: row.get(8)?,
    }))
}
