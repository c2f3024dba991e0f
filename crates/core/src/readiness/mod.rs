//! Per-musician readiness checklists

pub mod ports;
mod score;

pub use score::compute_readiness_score;

use std::sync::Arc;

use chrono::Utc;
use encore_domain::{EncoreError, GigReadiness, ReadinessReport, ReadinessUpdate, Result};
use tracing::debug;

use self::ports::ReadinessRepository;
use crate::access::GigAccess;

pub struct ReadinessService {
    repository: Arc<dyn ReadinessRepository>,
    access: GigAccess,
}

impl ReadinessService {
    pub fn new(repository: Arc<dyn ReadinessRepository>, access: GigAccess) -> Self {
        Self { repository, access }
    }

    /// The user's checklist for a gig; a blank one when nothing is saved yet.
    pub async fn get_my_readiness(&self, user_id: &str, gig_id: &str) -> Result<ReadinessReport> {
        self.access.visible(user_id, gig_id).await?;
        let readiness = self
            .repository
            .find(gig_id, user_id)
            .await?
            .unwrap_or_else(|| GigReadiness::blank(gig_id, user_id, Utc::now()));
        Ok(report(readiness))
    }

    pub async fn update_my_readiness(
        &self,
        user_id: &str,
        gig_id: &str,
        update: ReadinessUpdate,
    ) -> Result<ReadinessReport> {
        let membership = self.access.visible(user_id, gig_id).await?;
        if membership.gig.is_cancelled() {
            return Err(EncoreError::InvalidInput("The gig has been cancelled".to_string()));
        }

        let now = Utc::now();
        let mut readiness = self
            .repository
            .find(gig_id, user_id)
            .await?
            .unwrap_or_else(|| GigReadiness::blank(gig_id, user_id, now));
        readiness.apply(update, now);
        self.repository.upsert(&readiness).await?;

        debug!(gig_id, user_id, "readiness updated");
        Ok(report(readiness))
    }

    /// Every musician's checklist for a gig the user owns.
    pub async fn list_gig_readiness(
        &self,
        owner_id: &str,
        gig_id: &str,
    ) -> Result<Vec<ReadinessReport>> {
        self.access.owned(owner_id, gig_id).await?;
        let rows = self.repository.list_by_gig(gig_id).await?;
        Ok(rows.into_iter().map(report).collect())
    }
}

fn report(readiness: GigReadiness) -> ReadinessReport {
    let score = compute_readiness_score(&readiness);
    ReadinessReport { readiness, score }
}
