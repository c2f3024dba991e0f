//! Port interfaces for readiness checklists

use async_trait::async_trait;
use encore_domain::{GigReadiness, Result};

#[async_trait]
pub trait ReadinessRepository: Send + Sync {
    async fn find(&self, gig_id: &str, musician_id: &str) -> Result<Option<GigReadiness>>;

    /// Insert or replace the row for `(gig_id, musician_id)`.
    async fn upsert(&self, readiness: &GigReadiness) -> Result<()>;

    async fn list_by_gig(&self, gig_id: &str) -> Result<Vec<GigReadiness>>;
}
