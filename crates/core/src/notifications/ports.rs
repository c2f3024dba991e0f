//! Port interfaces for notification persistence

use async_trait::async_trait;
use encore_domain::{Notification, Result};

#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// Insert, or refresh the existing row with the same
    /// `(user_id, dedupe_key)`: title and body are replaced and the row is
    /// marked unread again. Returns the stored row.
    async fn create_or_update(&self, notification: &Notification) -> Result<Notification>;

    /// Plain insert without dedupe.
    async fn insert(&self, notification: &Notification) -> Result<()>;

    /// Newest first.
    async fn list(&self, user_id: &str, unread_only: bool, limit: u32)
        -> Result<Vec<Notification>>;

    async fn mark_read(&self, user_id: &str, id: &str) -> Result<bool>;

    async fn mark_all_read(&self, user_id: &str) -> Result<u32>;

    async fn unread_count(&self, user_id: &str) -> Result<u32>;
}
