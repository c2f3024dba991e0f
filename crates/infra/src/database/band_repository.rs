//! Band and profile repositories

use std::sync::Arc;

use async_trait::async_trait;
use encore_core::{BandRepository, ProfileRepository};
use encore_domain::{mapping, Band, EncoreError, Profile, Result as DomainResult};
use rusqlite::{params, Row};

use super::manager::{map_storage_error, run_blocking, DbManager};

const BAND_COLUMNS: &str = "id, owner_id, name, description, poster_skin, created_at, updated_at";

/// SQLite-backed implementation of `BandRepository`
pub struct SqliteBandRepository {
    db: Arc<DbManager>,
}

impl SqliteBandRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl BandRepository for SqliteBandRepository {
    async fn insert(&self, band: &Band) -> DomainResult<()> {
        let b = band.clone();
        run_blocking(&self.db, move |conn| {
            let sql =
                format!("INSERT INTO bands ({BAND_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)");
            conn.execute(
                &sql,
                params![b.id, b.owner_id, b.name, b.description, b.poster_skin, b.created_at, b.updated_at],
            )
            .map_err(map_storage_error)?;
            Ok(())
        })
        .await
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Band>> {
        let id = id.to_string();
        run_blocking(&self.db, move |conn| {
            let sql = format!("SELECT {BAND_COLUMNS} FROM bands WHERE id = ?1");
            conn.query_optional(&sql, params![id], map_band_row).map_err(map_storage_error)
        })
        .await
    }

    async fn update(&self, band: &Band) -> DomainResult<()> {
        let b = band.clone();
        run_blocking(&self.db, move |conn| {
            let changed = conn
                .execute(
                    "UPDATE bands SET name = ?2, description = ?3, poster_skin = ?4,
                        updated_at = ?5
                     WHERE id = ?1",
                    params![b.id, b.name, b.description, b.poster_skin, b.updated_at],
                )
                .map_err(map_storage_error)?;
            if changed == 0 {
                return Err(EncoreError::NotFound("Band not found".into()));
            }
            Ok(())
        })
        .await
    }

    async fn delete(&self, id: &str) -> DomainResult<bool> {
        let id = id.to_string();
        run_blocking(&self.db, move |conn| {
            let deleted = conn
                .execute("DELETE FROM bands WHERE id = ?1", params![id])
                .map_err(map_storage_error)?;
            Ok(deleted > 0)
        })
        .await
    }

    async fn list_by_owner(&self, owner_id: &str) -> DomainResult<Vec<Band>> {
        let owner_id = owner_id.to_string();
        run_blocking(&self.db, move |conn| {
            let sql = format!(
                "SELECT {BAND_COLUMNS} FROM bands WHERE owner_id = ?1
                 ORDER BY name COLLATE NOCASE ASC"
            );
            let mut stmt = conn.prepare(&sql).map_err(map_storage_error)?;
            stmt.query_map(params![owner_id], map_band_row).map_err(map_storage_error)
        })
        .await
    }
}

fn map_band_row(row: &Row<'_>) -> rusqlite::Result<Band> {
    Ok(Band {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        poster_skin: mapping::poster_skin(row.get(4)?),
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

// =============================================================================
// Profiles
// =============================================================================

/// SQLite-backed implementation of `ProfileRepository`
pub struct SqliteProfileRepository {
    db: Arc<DbManager>,
}

impl SqliteProfileRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ProfileRepository for SqliteProfileRepository {
    async fn find(&self, user_id: &str) -> DomainResult<Option<Profile>> {
        let user_id = user_id.to_string();
        run_blocking(&self.db, move |conn| {
            conn.query_optional(
                "SELECT id, display_name, email, instrument, phone, avatar_url, created_at,
                    updated_at
                 FROM profiles WHERE id = ?1",
                params![user_id],
                |row| {
                    Ok(Profile {
                        id: row.get(0)?,
                        display_name: mapping::text_or(row.get(1)?, ""),
                        email: row.get(2)?,
                        instrument: row.get(3)?,
                        phone: row.get(4)?,
                        avatar_url: row.get(5)?,
                        created_at: row.get(6)?,
                        updated_at: row.get(7)?,
                    })
                },
            )
            .map_err(map_storage_error)
        })
        .await
    }

    async fn upsert(&self, profile: &Profile) -> DomainResult<()> {
        let p = profile.clone();
        run_blocking(&self.db, move |conn| {
            conn.execute(
                "INSERT INTO profiles (id, display_name, email, instrument, phone, avatar_url,
                    created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                 ON CONFLICT (id) DO UPDATE SET
                    display_name = excluded.display_name,
                    email = excluded.email,
                    instrument = excluded.instrument,
                    phone = excluded.phone,
                    avatar_url = excluded.avatar_url,
                    updated_at = excluded.updated_at",
                params![
                    p.id,
                    p.display_name,
                    p.email,
                    p.instrument,
                    p.phone,
                    p.avatar_url,
                    p.created_at,
                    p.updated_at,
                ],
            )
            .map_err(map_storage_error)?;
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use encore_domain::{BandInput, ProfileUpdate};
    use tempfile::TempDir;

    use super::*;

    fn db() -> (TempDir, Arc<DbManager>) {
        let dir = TempDir::new().unwrap();
        let db = Arc::new(DbManager::new(dir.path().join("bands.db"), 2).unwrap());
        db.run_migrations().unwrap();
        (dir, db)
    }

    #[tokio::test]
    async fn bands_list_by_name() {
        let (_dir, db) = db();
        let repo = SqliteBandRepository::new(db);
        for name in ["zydeco Kings", "Brass Tacks", "alto Ego"] {
            let band = Band::from_input("owner-1", name.into(), BandInput::default(), Utc::now());
            repo.insert(&band).await.unwrap();
        }

        let names: Vec<_> =
            repo.list_by_owner("owner-1").await.unwrap().into_iter().map(|b| b.name).collect();
        assert_eq!(names, vec!["alto Ego", "Brass Tacks", "zydeco Kings"]);
        assert!(repo.list_by_owner("owner-2").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn band_update_and_delete() {
        let (_dir, db) = db();
        let repo = SqliteBandRepository::new(db);
        let mut band = Band::from_input("owner-1", "Trio".into(), BandInput::default(), Utc::now());
        repo.insert(&band).await.unwrap();

        band.apply(
            BandInput { description: Some("Jazz trio".into()), ..BandInput::default() },
            Utc::now(),
        );
        repo.update(&band).await.unwrap();
        let loaded = repo.find_by_id(&band.id).await.unwrap().unwrap();
        assert_eq!(loaded.description.as_deref(), Some("Jazz trio"));
        assert_eq!(loaded.poster_skin, "clean");

        assert!(repo.delete(&band.id).await.unwrap());
        assert!(repo.update(&band).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn profile_upsert_overwrites() {
        let (_dir, db) = db();
        let repo = SqliteProfileRepository::new(db);
        let mut profile = Profile::empty("user-1", Utc::now());
        repo.upsert(&profile).await.unwrap();

        profile.apply(
            ProfileUpdate {
                display_name: Some("Sam Keys".into()),
                instrument: Some("Piano".into()),
                ..ProfileUpdate::default()
            },
            Utc::now(),
        );
        repo.upsert(&profile).await.unwrap();

        let loaded = repo.find("user-1").await.unwrap().unwrap();
        assert_eq!(loaded.display_name, "Sam Keys");
        assert_eq!(loaded.instrument.as_deref(), Some("Piano"));
        assert!(repo.find("user-2").await.unwrap().is_none());
    }
}
