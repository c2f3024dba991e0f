//! Gig pack persistence: run-of-show, setlist, materials and contacts

use std::sync::Arc;

use async_trait::async_trait;
use encore_core::GigPackRepository;
use encore_domain::{
    mapping, GigContact, GigMaterial, MaterialKind, Result as DomainResult, ScheduleItem,
    SetlistItem,
};
use rusqlite::{params, Row};

use super::manager::{map_sql_error, map_storage_error, run_blocking, DbManager};

/// SQLite-backed implementation of `GigPackRepository`
pub struct SqliteGigPackRepository {
    db: Arc<DbManager>,
}

impl SqliteGigPackRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl GigPackRepository for SqliteGigPackRepository {
    // =========================================================================
    // Schedule
    // =========================================================================

    async fn list_schedule(&self, gig_id: &str) -> DomainResult<Vec<ScheduleItem>> {
        let gig_id = gig_id.to_string();
        run_blocking(&self.db, move |conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, gig_id, time, label, notes, position FROM gig_schedule_items
                     WHERE gig_id = ?1 ORDER BY position ASC, time ASC",
                )
                .map_err(map_storage_error)?;
            stmt.query_map(params![gig_id], |row| {
                Ok(ScheduleItem {
                    id: row.get(0)?,
                    gig_id: row.get(1)?,
                    time: row.get(2)?,
                    label: row.get(3)?,
                    notes: row.get(4)?,
                    position: mapping::count(row.get(5)?),
                })
            })
            .map_err(map_storage_error)
        })
        .await
    }

    async fn insert_schedule_item(&self, item: &ScheduleItem) -> DomainResult<()> {
        let item = item.clone();
        run_blocking(&self.db, move |conn| {
            conn.execute(
                "INSERT INTO gig_schedule_items (id, gig_id, time, label, notes, position)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![item.id, item.gig_id, item.time, item.label, item.notes, item.position],
            )
            .map_err(map_storage_error)?;
            Ok(())
        })
        .await
    }

    async fn delete_schedule_item(&self, gig_id: &str, item_id: &str) -> DomainResult<bool> {
        let gig_id = gig_id.to_string();
        let item_id = item_id.to_string();
        run_blocking(&self.db, move |conn| {
            let deleted = conn
                .execute(
                    "DELETE FROM gig_schedule_items WHERE id = ?1 AND gig_id = ?2",
                    params![item_id, gig_id],
                )
                .map_err(map_storage_error)?;
            Ok(deleted > 0)
        })
        .await
    }

    // =========================================================================
    // Setlist
    // =========================================================================

    async fn list_setlist(&self, gig_id: &str) -> DomainResult<Vec<SetlistItem>> {
        let gig_id = gig_id.to_string();
        run_blocking(&self.db, move |conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, gig_id, position, title, artist, song_key, bpm, duration_seconds,
                        notes
                     FROM gig_setlist_items WHERE gig_id = ?1 ORDER BY position ASC",
                )
                .map_err(map_storage_error)?;
            stmt.query_map(params![gig_id], map_setlist_row).map_err(map_storage_error)
        })
        .await
    }

    async fn replace_setlist(&self, gig_id: &str, items: &[SetlistItem]) -> DomainResult<()> {
        let gig_id = gig_id.to_string();
        let items = items.to_vec();
        run_blocking(&self.db, move |conn| {
            let tx = conn.transaction().map_err(map_sql_error)?;
            tx.execute("DELETE FROM gig_setlist_items WHERE gig_id = ?1", params![gig_id])
                .map_err(map_sql_error)?;
            {
                let mut insert = tx
                    .prepare(
                        "INSERT INTO gig_setlist_items (id, gig_id, position, title, artist,
                            song_key, bpm, duration_seconds, notes)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                    )
                    .map_err(map_sql_error)?;
                for item in &items {
                    insert
                        .execute(params![
                            item.id,
                            gig_id,
                            item.position,
                            item.title,
                            item.artist,
                            item.song_key,
                            item.bpm,
                            item.duration_seconds,
                            item.notes,
                        ])
                        .map_err(map_sql_error)?;
                }
            }
            tx.commit().map_err(map_sql_error)
        })
        .await
    }

    // =========================================================================
    // Materials
    // =========================================================================

    async fn list_materials(&self, gig_id: &str) -> DomainResult<Vec<GigMaterial>> {
        let gig_id = gig_id.to_string();
        run_blocking(&self.db, move |conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, gig_id, kind, label, url, storage_path, uploaded_by, created_at
                     FROM gig_materials WHERE gig_id = ?1 ORDER BY created_at ASC, id ASC",
                )
                .map_err(map_storage_error)?;
            stmt.query_map(params![gig_id], map_material_row).map_err(map_storage_error)
        })
        .await
    }

    async fn insert_material(&self, material: &GigMaterial) -> DomainResult<()> {
        let m = material.clone();
        run_blocking(&self.db, move |conn| {
            conn.execute(
                "INSERT INTO gig_materials (id, gig_id, kind, label, url, storage_path,
                    uploaded_by, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    m.id,
                    m.gig_id,
                    m.kind.as_str(),
                    m.label,
                    m.url,
                    m.storage_path,
                    m.uploaded_by,
                    m.created_at,
                ],
            )
            .map_err(map_storage_error)?;
            Ok(())
        })
        .await
    }

    async fn delete_material(
        &self,
        gig_id: &str,
        material_id: &str,
    ) -> DomainResult<Option<GigMaterial>> {
        let gig_id = gig_id.to_string();
        let material_id = material_id.to_string();
        run_blocking(&self.db, move |conn| {
            conn.query_optional(
                "DELETE FROM gig_materials WHERE id = ?1 AND gig_id = ?2
                 RETURNING id, gig_id, kind, label, url, storage_path, uploaded_by, created_at",
                params![material_id, gig_id],
                map_material_row,
            )
            .map_err(map_storage_error)
        })
        .await
    }

    // =========================================================================
    // Contacts
    // =========================================================================

    async fn list_contacts(&self, gig_id: &str) -> DomainResult<Vec<GigContact>> {
        let gig_id = gig_id.to_string();
        run_blocking(&self.db, move |conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, gig_id, name, role, phone, email FROM gig_contacts
                     WHERE gig_id = ?1 ORDER BY name ASC",
                )
                .map_err(map_storage_error)?;
            stmt.query_map(params![gig_id], |row| {
                Ok(GigContact {
                    id: row.get(0)?,
                    gig_id: row.get(1)?,
                    name: row.get(2)?,
                    role: row.get(3)?,
                    phone: row.get(4)?,
                    email: row.get(5)?,
                })
            })
            .map_err(map_storage_error)
        })
        .await
    }

    async fn insert_contact(&self, contact: &GigContact) -> DomainResult<()> {
        let c = contact.clone();
        run_blocking(&self.db, move |conn| {
            conn.execute(
                "INSERT INTO gig_contacts (id, gig_id, name, role, phone, email)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![c.id, c.gig_id, c.name, c.role, c.phone, c.email],
            )
            .map_err(map_storage_error)?;
            Ok(())
        })
        .await
    }

    async fn delete_contact(&self, gig_id: &str, contact_id: &str) -> DomainResult<bool> {
        let gig_id = gig_id.to_string();
        let contact_id = contact_id.to_string();
        run_blocking(&self.db, move |conn| {
            let deleted = conn
                .execute(
                    "DELETE FROM gig_contacts WHERE id = ?1 AND gig_id = ?2",
                    params![contact_id, gig_id],
                )
                .map_err(map_storage_error)?;
            Ok(deleted > 0)
        })
        .await
    }
}

// =============================================================================
// Row Mapping
// =============================================================================

fn map_setlist_row(row: &Row<'_>) -> rusqlite::Result<SetlistItem> {
    Ok(SetlistItem {
        id: row.get(0)?,
        gig_id: row.get(1)?,
        position: mapping::count(row.get(2)?),
        title: row.get(3)?,
        artist: row.get(4)?,
        song_key: row.get(5)?,
        bpm: row.get(6)?,
        duration_seconds: row.get(7)?,
        notes: row.get(8)?,
    })
}

fn map_material_row(row: &Row<'_>) -> rusqlite::Result<GigMaterial> {
    Ok(GigMaterial {
        id: row.get(0)?,
        gig_id: row.get(1)?,
        kind: mapping::status_or(row.get(2)?, MaterialKind::Other),
        label: row.get(3)?,
        url: row.get(4)?,
        storage_path: row.get(5)?,
        uploaded_by: row.get(6)?,
        created_at: row.get(7)?,
    })
}
