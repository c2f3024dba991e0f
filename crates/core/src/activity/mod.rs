//! Gig activity log
//!
//! Writes are best-effort: a failed insert is logged and swallowed so it
//! never fails the operation that produced it.

pub mod ports;

use std::sync::Arc;

use encore_domain::constants::ACTIVITY_DEFAULT_LIMIT;
use encore_domain::{ActivityEntry, ActivityType, Result};
use tracing::{debug, warn};

use self::ports::ActivityRepository;
use crate::access::GigAccess;

#[derive(Clone)]
pub struct ActivityLogger {
    repository: Arc<dyn ActivityRepository>,
    access: GigAccess,
}

impl ActivityLogger {
    pub fn new(repository: Arc<dyn ActivityRepository>, access: GigAccess) -> Self {
        Self { repository, access }
    }

    /// Record an entry; never fails.
    pub async fn record(
        &self,
        gig_id: &str,
        user_id: &str,
        activity_type: ActivityType,
        description: impl Into<String>,
        metadata: serde_json::Value,
    ) {
        let entry = ActivityEntry::new(gig_id, user_id, activity_type, description, metadata);
        match self.repository.insert(&entry).await {
            Ok(()) => debug!(gig_id, activity = %activity_type, "activity recorded"),
            Err(err) => {
                warn!(gig_id, activity = %activity_type, error = %err, "failed to record activity")
            }
        }
    }

    /// Activity for a gig the user can see, newest first.
    pub async fn list_activity(
        &self,
        user_id: &str,
        gig_id: &str,
        limit: Option<u32>,
    ) -> Result<Vec<ActivityEntry>> {
        self.access.visible(user_id, gig_id).await?;
        let limit = limit.filter(|l| *l > 0).unwrap_or(ACTIVITY_DEFAULT_LIMIT);
        self.repository.list_by_gig(gig_id, limit).await
    }
}
