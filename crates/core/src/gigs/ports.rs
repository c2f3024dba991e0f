//! Port interfaces for gig persistence

use async_trait::async_trait;
use chrono::NaiveDate;
use encore_domain::{Gig, Result};

/// Gig rows.
#[async_trait]
pub trait GigRepository: Send + Sync {
    async fn insert(&self, gig: &Gig) -> Result<()>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Gig>>;

    /// Overwrite every mutable column of an existing gig.
    async fn update(&self, gig: &Gig) -> Result<()>;

    /// Delete a gig and (via cascade) its roles and pack rows.
    async fn delete(&self, id: &str) -> Result<bool>;

    /// Gigs owned by `owner_id`, ascending by date.
    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Gig>>;

    /// Gig imported from the given provider event for this owner.
    async fn find_by_external_event(&self, owner_id: &str, event_id: &str) -> Result<Option<Gig>>;

    /// Non-cancelled gigs of `owner_id` that were imported from a calendar.
    async fn list_imported(&self, owner_id: &str) -> Result<Vec<Gig>>;

    /// Non-cancelled gigs between `from` and `to` (inclusive) that the user
    /// owns or holds an active role on.
    async fn list_for_user_between(
        &self,
        user_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Gig>>;

    /// Non-cancelled gigs of `owner_id` still linked to a calendar event.
    async fn count_calendar_linked(&self, owner_id: &str) -> Result<u32>;
}
