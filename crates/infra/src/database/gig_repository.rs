//! Gig repository implementation using SQLite

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use encore_core::GigRepository;
use encore_domain::constants::UNTITLED_GIG;
use encore_domain::{mapping, EncoreError, Gig, GigStatus, Result as DomainResult};
use rusqlite::{params, Row, ToSql};

use super::manager::{map_storage_error, run_blocking, DbManager};

/// Gig columns, always selected through the `g` alias.
pub(super) const GIG_COLUMNS: &str = "g.id, g.owner_id, g.band_id, g.title, g.date, g.start_time, \
     g.end_time, g.location_name, g.location_address, g.status, g.notes, g.poster_skin, \
     g.fee_cents, g.currency, g.external_calendar_event_id, g.external_calendar_provider, \
     g.calendar_event_id, g.created_at, g.updated_at";

/// Number of columns in [`GIG_COLUMNS`]; joined queries read theirs after it.
pub(super) const GIG_COLUMN_COUNT: usize = 19;

/// SQLite-backed implementation of `GigRepository`
pub struct SqliteGigRepository {
    db: Arc<DbManager>,
}

impl SqliteGigRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl GigRepository for SqliteGigRepository {
    async fn insert(&self, gig: &Gig) -> DomainResult<()> {
        let gig = gig.clone();
        run_blocking(&self.db, move |conn| {
            let params: [&dyn ToSql; 19] = [
                &gig.id,
                &gig.owner_id,
                &gig.band_id,
                &gig.title,
                &gig.date,
                &gig.start_time,
                &gig.end_time,
                &gig.location_name,
                &gig.location_address,
                &gig.status.as_str(),
                &gig.notes,
                &gig.poster_skin,
                &gig.fee_cents,
                &gig.currency,
                &gig.external_calendar_event_id,
                &gig.external_calendar_provider,
                &gig.calendar_event_id,
                &gig.created_at,
                &gig.updated_at,
            ];
            conn.execute(
                "INSERT INTO gigs (id, owner_id, band_id, title, date, start_time, end_time,
                    location_name, location_address, status, notes, poster_skin, fee_cents,
                    currency, external_calendar_event_id, external_calendar_provider,
                    calendar_event_id, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16,
                    ?17, ?18, ?19)",
                params.as_slice(),
            )
            .map_err(map_storage_error)?;
            Ok(())
        })
        .await
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Gig>> {
        let id = id.to_string();
        run_blocking(&self.db, move |conn| {
            let sql = format!("SELECT {GIG_COLUMNS} FROM gigs g WHERE g.id = ?1");
            conn.query_optional(&sql, params![id], |row| map_gig_row(row, 0))
                .map_err(map_storage_error)
        })
        .await
    }

    async fn update(&self, gig: &Gig) -> DomainResult<()> {
        let gig = gig.clone();
        run_blocking(&self.db, move |conn| {
            let params: [&dyn ToSql; 17] = [
                &gig.id,
                &gig.band_id,
                &gig.title,
                &gig.date,
                &gig.start_time,
                &gig.end_time,
                &gig.location_name,
                &gig.location_address,
                &gig.status.as_str(),
                &gig.notes,
                &gig.poster_skin,
                &gig.fee_cents,
                &gig.currency,
                &gig.external_calendar_event_id,
                &gig.external_calendar_provider,
                &gig.calendar_event_id,
                &gig.updated_at,
            ];
            let changed = conn
                .execute(
                    "UPDATE gigs SET band_id = ?2, title = ?3, date = ?4, start_time = ?5,
                        end_time = ?6, location_name = ?7, location_address = ?8, status = ?9,
                        notes = ?10, poster_skin = ?11, fee_cents = ?12, currency = ?13,
                        external_calendar_event_id = ?14, external_calendar_provider = ?15,
                        calendar_event_id = ?16, updated_at = ?17
                     WHERE id = ?1",
                    params.as_slice(),
                )
                .map_err(map_storage_error)?;
            if changed == 0 {
                return Err(EncoreError::NotFound("Gig not found".into()));
            }
            Ok(())
        })
        .await
    }

    async fn delete(&self, id: &str) -> DomainResult<bool> {
        let id = id.to_string();
        run_blocking(&self.db, move |conn| {
            let deleted = conn
                .execute("DELETE FROM gigs WHERE id = ?1", params![id])
                .map_err(map_storage_error)?;
            Ok(deleted > 0)
        })
        .await
    }

    async fn list_by_owner(&self, owner_id: &str) -> DomainResult<Vec<Gig>> {
        let owner_id = owner_id.to_string();
        run_blocking(&self.db, move |conn| {
            let sql = format!(
                "SELECT {GIG_COLUMNS} FROM gigs g WHERE g.owner_id = ?1
                 ORDER BY g.date ASC, g.start_time ASC, g.created_at ASC"
            );
            let mut stmt = conn.prepare(&sql).map_err(map_storage_error)?;
            stmt.query_map(params![owner_id], |row| map_gig_row(row, 0)).map_err(map_storage_error)
        })
        .await
    }

    async fn find_by_external_event(
        &self,
        owner_id: &str,
        event_id: &str,
    ) -> DomainResult<Option<Gig>> {
        let owner_id = owner_id.to_string();
        let event_id = event_id.to_string();
        run_blocking(&self.db, move |conn| {
            let sql = format!(
                "SELECT {GIG_COLUMNS} FROM gigs g
                 WHERE g.owner_id = ?1 AND g.external_calendar_event_id = ?2"
            );
            conn.query_optional(&sql, params![owner_id, event_id], |row| map_gig_row(row, 0))
                .map_err(map_storage_error)
        })
        .await
    }

    async fn list_imported(&self, owner_id: &str) -> DomainResult<Vec<Gig>> {
        let owner_id = owner_id.to_string();
        run_blocking(&self.db, move |conn| {
            let sql = format!(
                "SELECT {GIG_COLUMNS} FROM gigs g
                 WHERE g.owner_id = ?1
                   AND g.external_calendar_event_id IS NOT NULL
                   AND g.status != 'cancelled'
                 ORDER BY g.date ASC"
            );
            let mut stmt = conn.prepare(&sql).map_err(map_storage_error)?;
            stmt.query_map(params![owner_id], |row| map_gig_row(row, 0)).map_err(map_storage_error)
        })
        .await
    }

    async fn list_for_user_between(
        &self,
        user_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> DomainResult<Vec<Gig>> {
        let user_id = user_id.to_string();
        run_blocking(&self.db, move |conn| {
            let sql = format!(
                "SELECT {GIG_COLUMNS} FROM gigs g
                 WHERE g.date BETWEEN ?2 AND ?3
                   AND g.status != 'cancelled'
                   AND (g.owner_id = ?1 OR EXISTS (
                        SELECT 1 FROM gig_roles r
                        WHERE r.gig_id = g.id AND r.musician_id = ?1
                          AND r.invitation_status NOT IN ('declined', 'replaced')))
                 ORDER BY g.date ASC, g.start_time ASC"
            );
            let mut stmt = conn.prepare(&sql).map_err(map_storage_error)?;
            stmt.query_map(params![user_id, from, to], |row| map_gig_row(row, 0))
                .map_err(map_storage_error)
        })
        .await
    }

    async fn count_calendar_linked(&self, owner_id: &str) -> DomainResult<u32> {
        let owner_id = owner_id.to_string();
        run_blocking(&self.db, move |conn| {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM gigs
                     WHERE owner_id = ?1 AND calendar_event_id IS NOT NULL
                       AND status != 'cancelled'",
                    params![owner_id],
                    |row| row.get(0),
                )
                .map_err(map_storage_error)?;
            Ok(mapping::count(Some(count)))
        })
        .await
    }
}

// =============================================================================
// Row Mapping
// =============================================================================

/// Map the [`GIG_COLUMNS`] block starting at column `offset`.
pub(super) fn map_gig_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<Gig> {
    let col = |i: usize| offset + i;
    Ok(Gig {
        id: row.get(col(0))?,
        owner_id: row.get(col(1))?,
        band_id: mapping::non_empty(row.get(col(2))?),
        title: mapping::text_or(row.get(col(3))?, UNTITLED_GIG),
        date: row.get(col(4))?,
        start_time: row.get(col(5))?,
        end_time: row.get(col(6))?,
        location_name: mapping::non_empty(row.get(col(7))?),
        location_address: mapping::non_empty(row.get(col(8))?),
        status: mapping::status_or(row.get(col(9))?, GigStatus::Draft),
        notes: row.get(col(10))?,
        poster_skin: mapping::poster_skin(row.get(col(11))?),
        fee_cents: row.get(col(12))?,
        currency: mapping::currency(row.get(col(13))?),
        external_calendar_event_id: row.get(col(14))?,
        external_calendar_provider: row.get(col(15))?,
        calendar_event_id: row.get(col(16))?,
        created_at: row.get(col(17))?,
        updated_at: row.get(col(18))?,
    })
}

// =============================================================================
// Tests
// =============================================================================
