//! Dashboard views
//!
//! Both views try the aggregate query first. If it errors, the service logs a
//! warning and rebuilds the same rows from owned gigs and the user's role
//! rows using [`filter_dashboard_gigs`].

mod filter;
pub mod ports;

pub use filter::{filter_dashboard_gigs, lineup_stats, past, upcoming};

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use encore_domain::constants::{PAST_GIGS_DEFAULT_LIMIT, PAST_GIGS_MAX_LIMIT};
use encore_domain::{DashboardGig, LineupStats, PastGigsPage, Result};
use tracing::{instrument, warn};

use self::ports::DashboardRepository;
use crate::access::GigAccess;

pub struct DashboardService {
    repository: Arc<dyn DashboardRepository>,
    access: GigAccess,
}

impl DashboardService {
    pub fn new(repository: Arc<dyn DashboardRepository>, access: GigAccess) -> Self {
        Self { repository, access }
    }

    /// Upcoming gigs the user owns or plays on.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn list_dashboard_gigs(&self, user_id: &str) -> Result<Vec<DashboardGig>> {
        let today = Utc::now().date_naive();
        self.list_dashboard_gigs_on(user_id, today).await
    }

    pub async fn list_dashboard_gigs_on(
        &self,
        user_id: &str,
        today: NaiveDate,
    ) -> Result<Vec<DashboardGig>> {
        match self.repository.list_dashboard_gigs(user_id, today).await {
            Ok(rows) => Ok(rows),
            Err(err) => {
                warn!(error = %err, "dashboard query failed; using fallback");
                let rows = self.fallback_rows(user_id).await?;
                Ok(upcoming(rows, today))
            }
        }
    }

    /// One page of past gigs, newest first.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn list_past_gigs(
        &self,
        user_id: &str,
        limit: Option<u32>,
        offset: Option<u32>,
    ) -> Result<PastGigsPage> {
        let today = Utc::now().date_naive();
        self.list_past_gigs_on(user_id, today, limit, offset).await
    }

    pub async fn list_past_gigs_on(
        &self,
        user_id: &str,
        today: NaiveDate,
        limit: Option<u32>,
        offset: Option<u32>,
    ) -> Result<PastGigsPage> {
        let limit = limit
            .filter(|l| *l > 0)
            .unwrap_or(PAST_GIGS_DEFAULT_LIMIT)
            .min(PAST_GIGS_MAX_LIMIT);
        let offset = offset.unwrap_or(0);

        // One extra row tells us whether another page exists.
        let mut rows = match self.repository.list_past_gigs(user_id, today, limit + 1, offset).await
        {
            Ok(rows) => rows,
            Err(err) => {
                warn!(error = %err, "past gigs query failed; using fallback");
                let rows = self.fallback_rows(user_id).await?;
                past(rows, today)
                    .into_iter()
                    .skip(offset as usize)
                    .take(limit as usize + 1)
                    .collect()
            }
        };

        let has_more = rows.len() > limit as usize;
        rows.truncate(limit as usize);
        let next_offset = has_more.then(|| offset + limit);
        Ok(PastGigsPage { gigs: rows, has_more, next_offset })
    }

    async fn fallback_rows(&self, user_id: &str) -> Result<Vec<DashboardGig>> {
        let owned = self.access.gigs().list_by_owner(user_id).await?;
        let memberships = self.access.roles().list_invitations(user_id).await?;

        let mut stats: HashMap<String, LineupStats> = HashMap::new();
        let gig_ids = owned.iter().map(|g| &g.id).chain(memberships.iter().map(|m| &m.gig.id));
        for gig_id in gig_ids {
            if stats.contains_key(gig_id) {
                continue;
            }
            let roles = self.access.roles().list_by_gig(gig_id).await?;
            stats.insert(gig_id.clone(), lineup_stats(gig_id, &roles));
        }

        Ok(filter_dashboard_gigs(user_id, owned, memberships, &stats))
    }
}
