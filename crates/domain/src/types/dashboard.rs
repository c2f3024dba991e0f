//! Dashboard and payment views

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{Gig, InvitationStatus, PaymentStatus};

/// Gig as listed on a user's dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardGig {
    #[serde(flatten)]
    pub gig: Gig,
    pub is_owner: bool,
    pub my_role_id: Option<String>,
    pub my_role_name: Option<String>,
    pub my_invitation_status: Option<InvitationStatus>,
    pub lineup_count: u32,
    pub accepted_count: u32,
}

/// Membership row used by the dashboard fallback path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineupStats {
    pub gig_id: String,
    pub lineup_count: u32,
    pub accepted_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PastGigsPage {
    pub gigs: Vec<DashboardGig>,
    pub has_more: bool,
    pub next_offset: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSummary {
    pub gig_id: String,
    pub currency: String,
    pub total_agreed_cents: i64,
    pub paid_cents: i64,
    pub outstanding_cents: i64,
    pub roles_paid: u32,
    pub roles_unpaid: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EarningsLine {
    pub gig_id: String,
    pub gig_title: String,
    pub gig_date: NaiveDate,
    pub role_id: String,
    pub currency: String,
    pub fee_cents: i64,
    pub payment_status: PaymentStatus,
    pub paid_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyTotals {
    pub currency: String,
    pub paid_cents: i64,
    pub outstanding_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MusicianEarnings {
    pub totals: Vec<CurrencyTotals>,
    pub lines: Vec<EarningsLine>,
}
