//! Gig activity log persistence

use std::sync::Arc;

use async_trait::async_trait;
use encore_core::ActivityRepository;
use encore_domain::{ActivityEntry, ActivityType, EncoreError, Result as DomainResult};
use rusqlite::{params, Row};
use tracing::warn;

use super::manager::{map_storage_error, run_blocking, DbManager};

/// SQLite-backed implementation of `ActivityRepository`
pub struct SqliteActivityRepository {
    db: Arc<DbManager>,
}

impl SqliteActivityRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ActivityRepository for SqliteActivityRepository {
    async fn insert(&self, entry: &ActivityEntry) -> DomainResult<()> {
        let entry = entry.clone();
        let metadata = serde_json::to_string(&entry.metadata)
            .map_err(|e| EncoreError::InvalidInput(format!("activity metadata: {e}")))?;
        run_blocking(&self.db, move |conn| {
            conn.execute(
                "INSERT INTO gig_activity_log (id, gig_id, user_id, activity_type, description,
                    metadata, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    entry.id,
                    entry.gig_id,
                    entry.user_id,
                    entry.activity_type.as_str(),
                    entry.description,
                    metadata,
                    entry.created_at,
                ],
            )
            .map_err(map_storage_error)?;
            Ok(())
        })
        .await
    }

    async fn list_by_gig(&self, gig_id: &str, limit: u32) -> DomainResult<Vec<ActivityEntry>> {
        let gig_id = gig_id.to_string();
        run_blocking(&self.db, move |conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, gig_id, user_id, activity_type, description, metadata, created_at
                     FROM gig_activity_log WHERE gig_id = ?1
                     ORDER BY created_at DESC, id DESC
                     LIMIT ?2",
                )
                .map_err(map_storage_error)?;
            let rows = stmt
                .query_map(params![gig_id, limit], map_activity_row)
                .map_err(map_storage_error)?;
            Ok(rows.into_iter().flatten().collect())
        })
        .await
    }
}

/// Rows with an activity type this build does not know are skipped.
fn map_activity_row(row: &Row<'_>) -> rusqlite::Result<Option<ActivityEntry>> {
    let raw_type: String = row.get(3)?;
    let Ok(activity_type) = raw_type.parse::<ActivityType>() else {
        warn!(activity_type = %raw_type, "skipping activity row with unknown type");
        return Ok(None);
    };
    let metadata: Option<String> = row.get(5)?;
    Ok(Some(ActivityEntry {
        id: row.get(0)?,
        gig_id: row.get(1)?,
        user_id: row.get(2)?,
        activity_type,
        description: row.get(4)?,
        metadata: parse_metadata(metadata.as_deref()),
        created_at: row.get(6)?,
    }))
}

fn parse_metadata(raw: Option<&str>) -> serde_json::Value {
    raw.and_then(|text| serde_json::from_str(text).ok())
        .unwrap_or_else(|| serde_json::Value::Object(serde_json::Map::new()))
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate, Utc};
    use encore_core::GigRepository;
    use encore_domain::{Gig, NewGig};
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;
    use crate::database::SqliteGigRepository;

    #[tokio::test]
    async fn newest_entries_come_first() {
        let dir = TempDir::new().unwrap();
        let db = Arc::new(DbManager::new(dir.path().join("activity.db"), 2).unwrap());
        db.run_migrations().unwrap();
        let gig = Gig::from_new(
            "owner-1",
            NewGig {
                title: "Wedding".into(),
                date: NaiveDate::from_ymd_opt(2025, 9, 6).unwrap(),
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
        SqliteGigRepository::new(db.clone()).insert(&gig).await.unwrap();
        let repo = SqliteActivityRepository::new(db.clone());

        for (minutes, kind) in [(0, ActivityType::GigCreated), (5, ActivityType::RoleAdded)] {
            let mut entry =
                ActivityEntry::new(&gig.id, "owner-1", kind, "did a thing", json!({"n": minutes}));
            entry.created_at = Utc::now() + Duration::minutes(minutes);
            repo.insert(&entry).await.unwrap();
        }
        db.get_connection()
            .unwrap()
            .execute(
                "INSERT INTO gig_activity_log (id, gig_id, user_id, activity_type, description,
                    metadata, created_at)
                 VALUES ('legacy', ?1, 'owner-1', 'poster_printed', 'old', 'not json', ?2)",
                params![gig.id, Utc::now()],
            )
            .unwrap();

        let entries = repo.list_by_gig(&gig.id, 10).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].activity_type, ActivityType::RoleAdded);
        assert_eq!(entries[0].metadata["n"], 5);

        assert_eq!(repo.list_by_gig(&gig.id, 1).await.unwrap().len(), 1);
    }

    #[test]
    fn bad_metadata_becomes_an_empty_object() {
        assert_eq!(parse_metadata(Some("{oops")), json!({}));
        assert_eq!(parse_metadata(None), json!({}));
        assert_eq!(parse_metadata(Some(r#"{"a":1}"#)), json!({"a": 1}));
    }
}
