//! Port interfaces for gig-pack content and uploaded files

use async_trait::async_trait;
use encore_domain::{GigContact, GigMaterial, Result, ScheduleItem, SetlistItem};

#[async_trait]
pub trait GigPackRepository: Send + Sync {
    /// Ordered by position.
    async fn list_schedule(&self, gig_id: &str) -> Result<Vec<ScheduleItem>>;
    async fn insert_schedule_item(&self, item: &ScheduleItem) -> Result<()>;
    async fn delete_schedule_item(&self, gig_id: &str, item_id: &str) -> Result<bool>;

    /// Ordered by position.
    async fn list_setlist(&self, gig_id: &str) -> Result<Vec<SetlistItem>>;
    /// Replace the whole setlist in one transaction.
    async fn replace_setlist(&self, gig_id: &str, items: &[SetlistItem]) -> Result<()>;

    async fn list_materials(&self, gig_id: &str) -> Result<Vec<GigMaterial>>;
    async fn insert_material(&self, material: &GigMaterial) -> Result<()>;
    /// Remove and return the row so any stored object can be cleaned up.
    async fn delete_material(&self, gig_id: &str, material_id: &str)
        -> Result<Option<GigMaterial>>;

    async fn list_contacts(&self, gig_id: &str) -> Result<Vec<GigContact>>;
    async fn insert_contact(&self, contact: &GigContact) -> Result<()>;
    async fn delete_contact(&self, gig_id: &str, contact_id: &str) -> Result<bool>;
}

/// Blob storage for uploaded files.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Store `bytes` at `path` and return a URL clients can fetch it from.
    async fn put(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<String>;

    async fn delete(&self, path: &str) -> Result<()>;
}
