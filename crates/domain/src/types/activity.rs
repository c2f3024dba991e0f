//! Gig activity log

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::impl_domain_status_conversions;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    GigCreated,
    GigUpdated,
    GigCancelled,
    GigImported,
    RoleAdded,
    RoleUpdated,
    RoleRemoved,
    StatusChanged,
    InvitesSent,
    PaymentRecorded,
    SetlistUpdated,
    FileUploaded,
    CalendarSynced,
}

impl_domain_status_conversions!(ActivityType {
    GigCreated => "gig_created",
    GigUpdated => "gig_updated",
    GigCancelled => "gig_cancelled",
    GigImported => "gig_imported",
    RoleAdded => "role_added",
    RoleUpdated => "role_updated",
    RoleRemoved => "role_removed",
    StatusChanged => "status_changed",
    InvitesSent => "invites_sent",
    PaymentRecorded => "payment_recorded",
    SetlistUpdated => "setlist_updated",
    FileUploaded => "file_uploaded",
    CalendarSynced => "calendar_synced",
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
    pub id: String,
    pub gig_id: String,
    pub user_id: String,
    pub activity_type: ActivityType,
    pub description: String,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl ActivityEntry {
    pub fn new(
        gig_id: &str,
        user_id: &str,
        activity_type: ActivityType,
        description: impl Into<String>,
        metadata: serde_json::Value,
    ) -> Self {
        Self {
            id: super::new_id(),
            gig_id: gig_id.to_string(),
            user_id: user_id.to_string(),
            activity_type,
            description: description.into(),
            metadata,
            created_at: Utc::now(),
        }
    }
}
