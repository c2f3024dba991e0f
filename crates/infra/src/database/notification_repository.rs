//! Notification persistence with per-user dedupe

use std::sync::Arc;

use async_trait::async_trait;
use encore_core::NotificationRepository;
use encore_domain::{mapping, Notification, NotificationKind, Result as DomainResult};
use rusqlite::{params, Row, ToSql};

use super::manager::{map_storage_error, run_blocking, DbManager};

const NOTIFICATION_COLUMNS: &str =
    "id, user_id, kind, title, body, gig_id, dedupe_key, read, created_at, updated_at";

/// SQLite-backed implementation of `NotificationRepository`
pub struct SqliteNotificationRepository {
    db: Arc<DbManager>,
}

impl SqliteNotificationRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl NotificationRepository for SqliteNotificationRepository {
    async fn create_or_update(&self, notification: &Notification) -> DomainResult<Notification> {
        let n = notification.clone();
        run_blocking(&self.db, move |conn| {
            let params: [&dyn ToSql; 10] = [
                &n.id,
                &n.user_id,
                &n.kind.as_str(),
                &n.title,
                &n.body,
                &n.gig_id,
                &n.dedupe_key,
                &bool_to_int(n.read),
                &n.created_at,
                &n.updated_at,
            ];
            let sql = format!(
                "INSERT INTO notifications ({NOTIFICATION_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                 ON CONFLICT (user_id, dedupe_key) DO UPDATE SET
                    title = excluded.title,
                    body = excluded.body,
                    kind = excluded.kind,
                    read = 0,
                    updated_at = excluded.updated_at
                 RETURNING {NOTIFICATION_COLUMNS}"
            );
            conn.query_row(&sql, params.as_slice(), map_notification_row)
                .map_err(map_storage_error)
        })
        .await
    }

    async fn insert(&self, notification: &Notification) -> DomainResult<()> {
        let n = notification.clone();
        run_blocking(&self.db, move |conn| {
            // No dedupe key here: the row must not collide with an upserted one.
            let params: [&dyn ToSql; 9] = [
                &n.id,
                &n.user_id,
                &n.kind.as_str(),
                &n.title,
                &n.body,
                &n.gig_id,
                &bool_to_int(n.read),
                &n.created_at,
                &n.updated_at,
            ];
            conn.execute(
                "INSERT INTO notifications (id, user_id, kind, title, body, gig_id, read,
                    created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params.as_slice(),
            )
            .map_err(map_storage_error)?;
            Ok(())
        })
        .await
    }

    async fn list(
        &self,
        user_id: &str,
        unread_only: bool,
        limit: u32,
    ) -> DomainResult<Vec<Notification>> {
        let user_id = user_id.to_string();
        run_blocking(&self.db, move |conn| {
            let sql = format!(
                "SELECT {NOTIFICATION_COLUMNS} FROM notifications
                 WHERE user_id = ?1 AND (?2 = 0 OR read = 0)
                 ORDER BY updated_at DESC, id DESC
                 LIMIT ?3"
            );
            let mut stmt = conn.prepare(&sql).map_err(map_storage_error)?;
            stmt.query_map(params![user_id, bool_to_int(unread_only), limit], map_notification_row)
                .map_err(map_storage_error)
        })
        .await
    }

    async fn mark_read(&self, user_id: &str, id: &str) -> DomainResult<bool> {
        let user_id = user_id.to_string();
        let id = id.to_string();
        run_blocking(&self.db, move |conn| {
            let changed = conn
                .execute(
                    "UPDATE notifications SET read = 1 WHERE id = ?1 AND user_id = ?2",
                    params![id, user_id],
                )
                .map_err(map_storage_error)?;
            Ok(changed > 0)
        })
        .await
    }

    async fn mark_all_read(&self, user_id: &str) -> DomainResult<u32> {
        let user_id = user_id.to_string();
        run_blocking(&self.db, move |conn| {
            let changed = conn
                .execute(
                    "UPDATE notifications SET read = 1 WHERE user_id = ?1 AND read = 0",
                    params![user_id],
                )
                .map_err(map_storage_error)?;
            Ok(u32::try_from(changed).unwrap_or(u32::MAX))
        })
        .await
    }

    async fn unread_count(&self, user_id: &str) -> DomainResult<u32> {
        let user_id = user_id.to_string();
        run_blocking(&self.db, move |conn| {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM notifications WHERE user_id = ?1 AND read = 0",
                    params![user_id],
                    |row| row.get(0),
                )
                .map_err(map_storage_error)?;
            Ok(mapping::count(Some(count)))
        })
        .await
    }
}

fn map_notification_row(row: &Row<'_>) -> rusqlite::Result<Notification> {
    Ok(Notification {
        id: row.get(0)?,
        user_id: row.get(1)?,
        kind: mapping::status_or(row.get(2)?, NotificationKind::GigUpdated),
        title: row.get(3)?,
        body: row.get(4)?,
        gig_id: row.get(5)?,
        dedupe_key: row.get(6)?,
        read: mapping::flag(row.get(7)?),
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

fn bool_to_int(value: bool) -> i64 {
    i64::from(value)
}
