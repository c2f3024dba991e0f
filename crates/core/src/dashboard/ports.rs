//! Port interface for the dashboard aggregate queries

use async_trait::async_trait;
use chrono::NaiveDate;
use encore_domain::{DashboardGig, Result};

/// Single-query aggregates. Failures here are not fatal: the service falls
/// back to plain gig and role reads.
#[async_trait]
pub trait DashboardRepository: Send + Sync {
    /// Gigs dated `today` or later, ascending.
    async fn list_dashboard_gigs(&self, user_id: &str, today: NaiveDate)
        -> Result<Vec<DashboardGig>>;

    /// Gigs dated before `today`, newest first.
    async fn list_past_gigs(
        &self,
        user_id: &str,
        today: NaiveDate,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<DashboardGig>>;
}
