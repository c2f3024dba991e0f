//! Dashboard aggregate queries
//!
//! One query per view: the user's gigs (owned, or joined through a role the
//! dashboard shows) with their own role and lineup counts attached.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use encore_core::DashboardRepository;
use encore_domain::{mapping, DashboardGig, Result as DomainResult};
use rusqlite::{params, Row};

use super::gig_repository::{map_gig_row, GIG_COLUMNS, GIG_COLUMN_COUNT};
use super::manager::{map_storage_error, run_blocking, DbManager};

/// Shared SELECT; `?1` is the user, `?2` today.
fn dashboard_select(date_filter: &str, order: &str) -> String {
    format!(
        "SELECT {GIG_COLUMNS},
                g.owner_id = ?1 AS is_owner,
                me.id, me.role_name, me.invitation_status,
                (SELECT COUNT(*) FROM gig_roles x
                  WHERE x.gig_id = g.id
                    AND x.invitation_status NOT IN ('declined', 'replaced')) AS lineup_count,
                (SELECT COUNT(*) FROM gig_roles x
                  WHERE x.gig_id = g.id AND x.invitation_status = 'accepted') AS accepted_count
         FROM gigs g
         LEFT JOIN gig_roles me ON me.gig_id = g.id AND me.musician_id = ?1
         WHERE (g.owner_id = ?1 OR me.invitation_status NOT IN ('pending', 'declined'))
           AND {date_filter}
         ORDER BY {order}"
    )
}

/// SQLite-backed implementation of `DashboardRepository`
pub struct SqliteDashboardRepository {
    db: Arc<DbManager>,
}

impl SqliteDashboardRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl DashboardRepository for SqliteDashboardRepository {
    async fn list_dashboard_gigs(
        &self,
        user_id: &str,
        today: NaiveDate,
    ) -> DomainResult<Vec<DashboardGig>> {
        let user_id = user_id.to_string();
        run_blocking(&self.db, move |conn| {
            let sql = dashboard_select(
                "g.date >= ?2",
                "g.date ASC, g.start_time ASC, g.created_at ASC",
            );
            let mut stmt = conn.prepare(&sql).map_err(map_storage_error)?;
            stmt.query_map(params![user_id, today], map_dashboard_row).map_err(map_storage_error)
        })
        .await
    }

    async fn list_past_gigs(
        &self,
        user_id: &str,
        today: NaiveDate,
        limit: u32,
        offset: u32,
    ) -> DomainResult<Vec<DashboardGig>> {
        let user_id = user_id.to_string();
        run_blocking(&self.db, move |conn| {
            let sql = format!(
                "{} LIMIT ?3 OFFSET ?4",
                dashboard_select(
                    "g.date < ?2",
                    "g.date DESC, g.start_time DESC, g.created_at DESC",
                )
            );
            let mut stmt = conn.prepare(&sql).map_err(map_storage_error)?;
            stmt.query_map(params![user_id, today, limit, offset], map_dashboard_row)
                .map_err(map_storage_error)
        })
        .await
    }
}

fn map_dashboard_row(row: &Row<'_>) -> rusqlite::Result<DashboardGig> {
    let base = GIG_COLUMN_COUNT;
    let status: Option<String> = row.get(base + 3)?;
    Ok(DashboardGig {
        gig: map_gig_row(row, 0)?,
        is_owner: mapping::flag(row.get(base)?),
        my_role_id: row.get(base + 1)?,
        my_role_name: row.get(base + 2)?,
        my_invitation_status: status.and_then(|s| s.parse().ok()),
        lineup_count: mapping::count(row.get(base + 4)?),
        accepted_count: mapping::count(row.get(base + 5)?),
    })
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use encore_core::{GigRepository, RoleRepository};
    use encore_domain::{Gig, GigRole, InvitationStatus, NewGig, NewRole};
    use tempfile::TempDir;

    use super::*;
    use crate::database::{SqliteGigRepository, SqliteRoleRepository};

    struct Fixture {
        _dir: TempDir,
        gigs: SqliteGigRepository,
        roles: SqliteRoleRepository,
        dashboard: SqliteDashboardRepository,
    }

    fn setup() -> Fixture {
        let dir = TempDir::new().unwrap();
        let db = Arc::new(DbManager::new(dir.path().join("dashboard.db"), 2).unwrap());
        db.run_migrations().unwrap();
        Fixture {
            _dir: dir,
            gigs: SqliteGigRepository::new(db.clone()),
            roles: SqliteRoleRepository::new(db.clone()),
            dashboard: SqliteDashboardRepository::new(db),
        }
    }

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, d).unwrap()
    }

    async fn gig(f: &Fixture, owner: &str, title: &str, on: NaiveDate) -> Gig {
        let gig = Gig::from_new(
            owner,
            NewGig {
                title: title.into(),
                date: on,
                start_time: None,
                end_time: None,
                location_name: None,
                location_address: None,
                status: None,
                notes: None,
                poster_skin: None,
                fee_cents: None,
                currency: None,
                band_id: None,
            },
            Utc::now(),
        );
        f.gigs.insert(&gig).await.unwrap();
        gig
    }

    async fn role(f: &Fixture, gig: &Gig, musician: &str, status: InvitationStatus) -> GigRole {
        let mut role = GigRole::from_new(
            &gig.id,
            NewRole {
                musician_id: Some(musician.into()),
                role_name: "Guitar".into(),
                ..NewRole::default()
            },
            Utc::now(),
        );
        role.invitation_status = status;
        f.roles.insert(&role).await.unwrap();
        role
    }

    #[tokio::test]
    async fn upcoming_view_matches_visibility_rules() {
        let f = setup();
        let today = date(6, 1);
        let owned = gig(&f, "me", "Own show", date(6, 10)).await;
        let accepted = gig(&f, "leader", "Accepted", date(6, 5)).await;
        let pending = gig(&f, "leader", "Pending", date(6, 6)).await;
        let declined = gig(&f, "leader", "Declined", date(6, 7)).await;
        let past = gig(&f, "leader", "Past", date(5, 1)).await;

        let mine = role(&f, &accepted, "me", InvitationStatus::Accepted).await;
        role(&f, &accepted, "other", InvitationStatus::Invited).await;
        role(&f, &accepted, "gone", InvitationStatus::Declined).await;
        role(&f, &pending, "me", InvitationStatus::Pending).await;
        role(&f, &declined, "me", InvitationStatus::Declined).await;
        role(&f, &past, "me", InvitationStatus::Accepted).await;

        let rows = f.dashboard.list_dashboard_gigs("me", today).await.unwrap();

        let titles: Vec<_> = rows.iter().map(|r| r.gig.title.as_str()).collect();
        assert_eq!(titles, vec!["Accepted", "Own show"]);
        assert!(!rows[0].is_owner);
        assert_eq!(rows[0].my_role_id.as_deref(), Some(mine.id.as_str()));
        assert_eq!(rows[0].my_invitation_status, Some(InvitationStatus::Accepted));
        assert_eq!((rows[0].lineup_count, rows[0].accepted_count), (2, 1));
        assert!(rows[1].is_owner);
        assert_eq!(rows[1].gig.id, owned.id);
        assert_eq!(rows[1].my_role_id, None);
    }

    #[tokio::test]
    async fn past_view_is_newest_first_and_paged() {
        let f = setup();
        for day in 1..=5 {
            gig(&f, "me", &format!("May {day}"), date(5, day)).await;
        }

        let first = f.dashboard.list_past_gigs("me", date(6, 1), 2, 0).await.unwrap();
        let titles: Vec<_> = first.iter().map(|r| r.gig.title.as_str()).collect();
        assert_eq!(titles, vec!["May 5", "May 4"]);

        let last = f.dashboard.list_past_gigs("me", date(6, 1), 2, 4).await.unwrap();
        assert_eq!(last.len(), 1);
        assert_eq!(last[0].gig.title, "May 1");
    }
}
