//! Lineup roles and their invitation lifecycle

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::impl_domain_status_conversions;
use crate::mapping;

/// Invitation lifecycle of a role
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvitationStatus {
    #[default]
    Pending,
    Invited,
    Accepted,
    Declined,
    NeedsSub,
    Replaced,
}

impl_domain_status_conversions!(InvitationStatus {
    Pending => "pending",
    Invited => "invited",
    Accepted => "accepted",
    Declined => "declined",
    NeedsSub => "needs_sub",
    Replaced => "replaced",
});

impl InvitationStatus {
    /// Allowed status moves. Re-asserting the current status is a no-op and
    /// always allowed.
    pub fn can_transition_to(self, next: Self) -> bool {
        use InvitationStatus::{Accepted, Declined, Invited, NeedsSub, Pending, Replaced};

        if self == next {
            return true;
        }
        match self {
            Pending => matches!(next, Invited | Accepted | Declined | Replaced),
            Invited => matches!(next, Accepted | Declined | NeedsSub | Replaced),
            Accepted => matches!(next, Declined | NeedsSub | Replaced),
            Declined => matches!(next, Accepted | Replaced),
            NeedsSub => matches!(next, Accepted | Replaced),
            Replaced => false,
        }
    }

    /// Still part of the lineup (should be on the calendar invite).
    pub fn is_active(self) -> bool {
        !matches!(self, Self::Declined | Self::Replaced)
    }

    /// Makes the gig show up on the musician's dashboard.
    pub fn shows_on_dashboard(self) -> bool {
        !matches!(self, Self::Pending | Self::Declined)
    }

    /// Status changes the gig owner wants to hear about.
    pub fn notifies_owner(self) -> bool {
        matches!(self, Self::Accepted | Self::Declined | Self::NeedsSub)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Unpaid,
    Paid,
}

impl_domain_status_conversions!(PaymentStatus {
    Unpaid => "unpaid",
    Paid => "paid",
});

/// A musician's assignment to a gig
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GigRole {
    pub id: String,
    pub gig_id: String,
    /// Encore user, when the musician has an account.
    pub musician_id: Option<String>,
    pub musician_name: Option<String>,
    pub musician_email: Option<String>,
    pub role_name: String,
    pub invitation_status: InvitationStatus,
    pub agreed_fee_cents: Option<i64>,
    pub payment_status: PaymentStatus,
    pub paid_at: Option<DateTime<Utc>>,
    /// Per-role calendar event from before gig-level events existed.
    pub calendar_event_id: Option<String>,
    pub invited_at: Option<DateTime<Utc>>,
    pub responded_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GigRole {
    pub fn from_new(gig_id: &str, input: NewRole, now: DateTime<Utc>) -> Self {
        Self {
            id: super::new_id(),
            gig_id: gig_id.to_string(),
            musician_id: mapping::non_empty(input.musician_id),
            musician_name: mapping::non_empty(input.musician_name),
            musician_email: mapping::non_empty(input.musician_email).map(|e| e.to_lowercase()),
            role_name: mapping::text_or(Some(input.role_name), "Musician"),
            invitation_status: InvitationStatus::Pending,
            agreed_fee_cents: input.agreed_fee_cents,
            payment_status: PaymentStatus::Unpaid,
            paid_at: None,
            calendar_event_id: None,
            invited_at: None,
            responded_at: None,
            notes: mapping::non_empty(input.notes),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn belongs_to(&self, user_id: &str) -> bool {
        self.musician_id.as_deref() == Some(user_id)
    }

    /// Lower-cased e-mail used for attendee matching.
    pub fn email_key(&self) -> Option<String> {
        self.musician_email.as_deref().map(str::to_lowercase)
    }

    pub fn display_name(&self) -> &str {
        self.musician_name
            .as_deref()
            .or(self.musician_email.as_deref())
            .unwrap_or(self.role_name.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewRole {
    pub musician_id: Option<String>,
    pub musician_name: Option<String>,
    pub musician_email: Option<String>,
    pub role_name: String,
    pub agreed_fee_cents: Option<i64>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RoleUpdate {
    pub role_name: Option<String>,
    pub musician_name: Option<String>,
    pub musician_email: Option<String>,
    pub agreed_fee_cents: Option<i64>,
    pub notes: Option<String>,
}

impl RoleUpdate {
    pub fn apply(self, role: &mut GigRole, now: DateTime<Utc>) {
        if let Some(name) = mapping::non_empty(self.role_name) {
            role.role_name = name;
        }
        if self.musician_name.is_some() {
            role.musician_name = mapping::non_empty(self.musician_name);
        }
        if self.musician_email.is_some() {
            role.musician_email = mapping::non_empty(self.musician_email).map(|e| e.to_lowercase());
        }
        if self.agreed_fee_cents.is_some() {
            role.agreed_fee_cents = self.agreed_fee_cents;
        }
        if self.notes.is_some() {
            role.notes = mapping::non_empty(self.notes);
        }
        role.updated_at = now;
    }
}

/// A role joined with the gig it belongs to, for "my invitations" views
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invitation {
    pub role: GigRole,
    pub gig: super::Gig,
}
