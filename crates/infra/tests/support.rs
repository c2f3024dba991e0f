#![allow(dead_code)]

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime, Utc};
use encore_common::testing::TempDir;
use encore_domain::{Gig, GigRole, GigStatus, NewGig, NewRole};
use encore_infra::database::DbManager;

/// Migrated database in its own temporary directory.
pub struct TestDatabase {
    pub db: Arc<DbManager>,
    _temp_dir: TempDir,
}

impl TestDatabase {
    pub fn new() -> Self {
        let temp_dir = TempDir::new("encore-infra-tests").expect("temporary directory");
        let db = DbManager::new(temp_dir.path().join("encore.db"), 4).expect("open database");
        db.run_migrations().expect("apply schema");
        Self { db: Arc::new(db), _temp_dir: temp_dir }
    }
}

impl Default for TestDatabase {
    fn default() -> Self {
        Self::new()
    }
}

pub fn day(month: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2030, month, d).expect("valid date")
}

pub fn gig(owner: &str, title: &str, date: NaiveDate) -> Gig {
    Gig::from_new(
        owner,
        NewGig {
            title: title.to_string(),
            date,
            start_time: NaiveTime::from_hms_opt(20, 0, 0),
            end_time: NaiveTime::from_hms_opt(23, 0, 0),
            location_name: Some("Blue Room".to_string()),
            location_address: None,
            status: Some(GigStatus::Confirmed),
            notes: None,
            poster_skin: None,
            fee_cents: None,
            currency: None,
            band_id: None,
        },
        Utc::now(),
    )
}

pub fn role(gig_id: &str, musician_id: &str, role_name: &str) -> GigRole {
    GigRole::from_new(
        gig_id,
        NewRole {
            musician_id: Some(musician_id.to_string()),
            musician_email: Some(format!("{musician_id}@example.com")),
            role_name: role_name.to_string(),
            ..NewRole::default()
        },
        Utc::now(),
    )
}
