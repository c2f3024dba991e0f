//! Port interfaces for the gig activity log

use async_trait::async_trait;
use encore_domain::{ActivityEntry, Result};

#[async_trait]
pub trait ActivityRepository: Send + Sync {
    async fn insert(&self, entry: &ActivityEntry) -> Result<()>;

    /// Newest first.
    async fn list_by_gig(&self, gig_id: &str, limit: u32) -> Result<Vec<ActivityEntry>>;
}
