//! In-app notifications

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::impl_domain_status_conversions;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    GigInvitation,
    InvitationAccepted,
    InvitationDeclined,
    NeedsSub,
    GigUpdated,
    GigCancelled,
    PaymentReceived,
    RsvpUpdated,
}

impl_domain_status_conversions!(NotificationKind {
    GigInvitation => "gig_invitation",
    InvitationAccepted => "invitation_accepted",
    InvitationDeclined => "invitation_declined",
    NeedsSub => "needs_sub",
    GigUpdated => "gig_updated",
    GigCancelled => "gig_cancelled",
    PaymentReceived => "payment_received",
    RsvpUpdated => "rsvp_updated",
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub user_id: String,
    pub kind: NotificationKind,
    pub title: String,
    pub body: Option<String>,
    pub gig_id: Option<String>,
    /// Repeated events with the same key update one row instead of piling up.
    pub dedupe_key: Option<String>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNotification {
    pub user_id: String,
    pub kind: NotificationKind,
    pub title: String,
    pub body: Option<String>,
    pub gig_id: Option<String>,
    pub dedupe_key: Option<String>,
}

impl NewNotification {
    pub fn new(user_id: &str, kind: NotificationKind, title: impl Into<String>) -> Self {
        Self {
            user_id: user_id.to_string(),
            kind,
            title: title.into(),
            body: None,
            gig_id: None,
            dedupe_key: None,
        }
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Attach the gig and derive the dedupe key `{kind}:{gig}`.
    pub fn for_gig(mut self, gig_id: &str) -> Self {
        self.gig_id = Some(gig_id.to_string());
        self.dedupe_key = Some(format!("{}:{}", self.kind, gig_id));
        self
    }

    /// Override the dedupe key, e.g. to make it per recipient.
    pub fn dedupe_key(mut self, key: impl Into<String>) -> Self {
        self.dedupe_key = Some(key.into());
        self
    }

    pub fn into_notification(self, now: DateTime<Utc>) -> Notification {
        Notification {
            id: super::new_id(),
            user_id: self.user_id,
            kind: self.kind,
            title: self.title,
            body: self.body,
            gig_id: self.gig_id,
            dedupe_key: self.dedupe_key,
            read: false,
            created_at: now,
            updated_at: now,
        }
    }
}
