//! Readiness checklist persistence

use std::sync::Arc;

use async_trait::async_trait;
use encore_core::ReadinessRepository;
use encore_domain::{mapping, GigReadiness, Result as DomainResult};
use rusqlite::{params, Row, ToSql};

use super::manager::{map_storage_error, run_blocking, DbManager};

const READINESS_COLUMNS: &str = "id, gig_id, musician_id, songs_total, songs_learned, \
     charts_ready, sounds_ready, travel_checked, gear_packed, notes, updated_at";

/// SQLite-backed implementation of `ReadinessRepository`
pub struct SqliteReadinessRepository {
    db: Arc<DbManager>,
}

impl SqliteReadinessRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ReadinessRepository for SqliteReadinessRepository {
    async fn find(&self, gig_id: &str, musician_id: &str) -> DomainResult<Option<GigReadiness>> {
        let gig_id = gig_id.to_string();
        let musician_id = musician_id.to_string();
        run_blocking(&self.db, move |conn| {
            let sql = format!(
                "SELECT {READINESS_COLUMNS} FROM gig_readiness WHERE gig_id = ?1 AND musician_id = ?2"
            );
            conn.query_optional(&sql, params![gig_id, musician_id], map_readiness_row)
                .map_err(map_storage_error)
        })
        .await
    }

    async fn upsert(&self, readiness: &GigReadiness) -> DomainResult<()> {
        let r = readiness.clone();
        run_blocking(&self.db, move |conn| {
            let params: [&dyn ToSql; 11] = [
                &r.id,
                &r.gig_id,
                &r.musician_id,
                &r.songs_total,
                &r.songs_learned,
                &i64::from(r.charts_ready),
                &i64::from(r.sounds_ready),
                &i64::from(r.travel_checked),
                &i64::from(r.gear_packed),
                &r.notes,
                &r.updated_at,
            ];
            let sql = format!(
                "INSERT INTO gig_readiness ({READINESS_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                 ON CONFLICT (gig_id, musician_id) DO UPDATE SET
                    songs_total = excluded.songs_total,
                    songs_learned = excluded.songs_learned,
                    charts_ready = excluded.charts_ready,
                    sounds_ready = excluded.sounds_ready,
                    travel_checked = excluded.travel_checked,
                    gear_packed = excluded.gear_packed,
                    notes = excluded.notes,
                    updated_at = excluded.updated_at"
            );
            conn.execute(&sql, params.as_slice()).map_err(map_storage_error)?;
            Ok(())
        })
        .await
    }

    async fn list_by_gig(&self, gig_id: &str) -> DomainResult<Vec<GigReadiness>> {
        let gig_id = gig_id.to_string();
        run_blocking(&self.db, move |conn| {
            let sql = format!(
                "SELECT {READINESS_COLUMNS} FROM gig_readiness WHERE gig_id = ?1
                 ORDER BY musician_id ASC"
            );
            let mut stmt = conn.prepare(&sql).map_err(map_storage_error)?;
            stmt.query_map(params![gig_id], map_readiness_row).map_err(map_storage_error)
        })
        .await
    }
}

fn map_readiness_row(row: &Row<'_>) -> rusqlite::Result<GigReadiness> {
    Ok(GigReadiness {
        id: row.get(0)?,
        gig_id: row.get(1)?,
        musician_id: row.get(2)?,
        songs_total: mapping::count(row.get(3)?),
        songs_learned: mapping::count(row.get(4)?),
        charts_ready: mapping::flag(row.get(5)?),
        sounds_ready: mapping::flag(row.get(6)?),
        travel_checked: mapping::flag(row.get(7)?),
        gear_packed: mapping::flag(row.get(8)?),
        notes: row.get(9)?,
        updated_at: row.get(10)?,
    })
}
