//! Role / invitation repository implementation using SQLite

use std::sync::Arc;

use async_trait::async_trait;
use encore_core::RoleRepository;
use encore_domain::{
    mapping, EncoreError, GigRole, Invitation, InvitationStatus, PaymentStatus,
    Result as DomainResult,
};
use rusqlite::{params, Row, ToSql};

use super::gig_repository::{map_gig_row, GIG_COLUMNS, GIG_COLUMN_COUNT};
use super::manager::{map_storage_error, run_blocking, DbManager};

const ROLE_COLUMNS: &str = "r.id, r.gig_id, r.musician_id, r.musician_name, r.musician_email, \
     r.role_name, r.invitation_status, r.agreed_fee_cents, r.payment_status, r.paid_at, \
     r.calendar_event_id, r.invited_at, r.responded_at, r.notes, r.created_at, r.updated_at";

/// SQLite-backed implementation of `RoleRepository`
pub struct SqliteRoleRepository {
    db: Arc<DbManager>,
}

impl SqliteRoleRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RoleRepository for SqliteRoleRepository {
    async fn insert(&self, role: &GigRole) -> DomainResult<()> {
        let role = role.clone();
        run_blocking(&self.db, move |conn| {
            let params: [&dyn ToSql; 16] = [
                &role.id,
                &role.gig_id,
                &role.musician_id,
                &role.musician_name,
                &role.musician_email,
                &role.role_name,
                &role.invitation_status.as_str(),
                &role.agreed_fee_cents,
                &role.payment_status.as_str(),
                &role.paid_at,
                &role.calendar_event_id,
                &role.invited_at,
                &role.responded_at,
                &role.notes,
                &role.created_at,
                &role.updated_at,
            ];
            conn.execute(
                "INSERT INTO gig_roles (id, gig_id, musician_id, musician_name, musician_email,
                    role_name, invitation_status, agreed_fee_cents, payment_status, paid_at,
                    calendar_event_id, invited_at, responded_at, notes, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
                params.as_slice(),
            )
            .map_err(map_storage_error)
            .map_err(|err| match err {
                EncoreError::Conflict(_) => {
                    EncoreError::Conflict("Musician already has a role on this gig".into())
                }
                other => other,
            })?;
            Ok(())
        })
        .await
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<GigRole>> {
        let id = id.to_string();
        run_blocking(&self.db, move |conn| {
            let sql = format!("SELECT {ROLE_COLUMNS} FROM gig_roles r WHERE r.id = ?1");
            conn.query_optional(&sql, params![id], |row| map_role_row(row, 0))
                .map_err(map_storage_error)
        })
        .await
    }

    async fn update(&self, role: &GigRole) -> DomainResult<()> {
        let role = role.clone();
        run_blocking(&self.db, move |conn| {
            let params: [&dyn ToSql; 14] = [
                &role.id,
                &role.musician_id,
                &role.musician_name,
                &role.musician_email,
                &role.role_name,
                &role.invitation_status.as_str(),
                &role.agreed_fee_cents,
                &role.payment_status.as_str(),
                &role.paid_at,
                &role.calendar_event_id,
                &role.invited_at,
                &role.responded_at,
                &role.notes,
                &role.updated_at,
            ];
            let changed = conn
                .execute(
                    "UPDATE gig_roles SET musician_id = ?2, musician_name = ?3,
                        musician_email = ?4, role_name = ?5, invitation_status = ?6,
                        agreed_fee_cents = ?7, payment_status = ?8, paid_at = ?9,
                        calendar_event_id = ?10, invited_at = ?11, responded_at = ?12,
                        notes = ?13, updated_at = ?14
                     WHERE id = ?1",
                    params.as_slice(),
                )
                .map_err(map_storage_error)?;
            if changed == 0 {
                return Err(EncoreError::NotFound("Role not found".into()));
            }
            Ok(())
        })
        .await
    }

    async fn delete(&self, id: &str) -> DomainResult<bool> {
        let id = id.to_string();
        run_blocking(&self.db, move |conn| {
            let deleted = conn
                .execute("DELETE FROM gig_roles WHERE id = ?1", params![id])
                .map_err(map_storage_error)?;
            Ok(deleted > 0)
        })
        .await
    }

    async fn list_by_gig(&self, gig_id: &str) -> DomainResult<Vec<GigRole>> {
        let gig_id = gig_id.to_string();
        run_blocking(&self.db, move |conn| {
            let sql = format!(
                "SELECT {ROLE_COLUMNS} FROM gig_roles r WHERE r.gig_id = ?1
                 ORDER BY r.created_at ASC, r.id ASC"
            );
            let mut stmt = conn.prepare(&sql).map_err(map_storage_error)?;
            stmt.query_map(params![gig_id], |row| map_role_row(row, 0)).map_err(map_storage_error)
        })
        .await
    }

    async fn find_for_musician(
        &self,
        gig_id: &str,
        musician_id: &str,
    ) -> DomainResult<Option<GigRole>> {
        let gig_id = gig_id.to_string();
        let musician_id = musician_id.to_string();
        run_blocking(&self.db, move |conn| {
            let sql = format!(
                "SELECT {ROLE_COLUMNS} FROM gig_roles r WHERE r.gig_id = ?1 AND r.musician_id = ?2"
            );
            conn.query_optional(&sql, params![gig_id, musician_id], |row| map_role_row(row, 0))
                .map_err(map_storage_error)
        })
        .await
    }

    async fn list_invitations(&self, musician_id: &str) -> DomainResult<Vec<Invitation>> {
        let musician_id = musician_id.to_string();
        run_blocking(&self.db, move |conn| {
            let sql = format!(
                "SELECT {GIG_COLUMNS}, {ROLE_COLUMNS}
                 FROM gig_roles r JOIN gigs g ON g.id = r.gig_id
                 WHERE r.musician_id = ?1
                 ORDER BY g.date ASC, g.start_time ASC"
            );
            let mut stmt = conn.prepare(&sql).map_err(map_storage_error)?;
            stmt.query_map(params![musician_id], |row| {
                Ok(Invitation { gig: map_gig_row(row, 0)?, role: map_role_row(row, GIG_COLUMN_COUNT)? })
            })
            .map_err(map_storage_error)
        })
        .await
    }
}

// =============================================================================
// Row Mapping
// =============================================================================

pub(super) fn map_role_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<GigRole> {
    let col = |i: usize| offset + i;
    Ok(GigRole {
        id: row.get(col(0))?,
        gig_id: row.get(col(1))?,
        musician_id: mapping::non_empty(row.get(col(2))?),
        musician_name: mapping::non_empty(row.get(col(3))?),
        musician_email: mapping::non_empty(row.get(col(4))?),
        role_name: mapping::text_or(row.get(col(5))?, "Musician"),
        invitation_status: mapping::status_or(row.get(col(6))?, InvitationStatus::Pending),
        agreed_fee_cents: row.get(col(7))?,
        payment_status: mapping::status_or(row.get(col(8))?, PaymentStatus::Unpaid),
        paid_at: row.get(col(9))?,
        calendar_event_id: row.get(col(10))?,
        invited_at: row.get(col(11))?,
        responded_at: row.get(col(12))?,
        notes: row.get(col(13))?,
        created_at: row.get(col(14))?,
        updated_at: row.get(col(15))?,
    })
}

// =============================================================================
// Tests
// =============================================================================
