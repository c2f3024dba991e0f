//! Port interfaces for bands and profiles

use async_trait::async_trait;
use encore_domain::{Band, Profile, Result};

#[async_trait]
pub trait BandRepository: Send + Sync {
    async fn insert(&self, band: &Band) -> Result<()>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Band>>;
    async fn update(&self, band: &Band) -> Result<()>;
    async fn delete(&self, id: &str) -> Result<bool>;
    /// Ordered by name.
    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Band>>;
}

#[async_trait]
pub trait ProfileRepository: Send + Sync {
    async fn find(&self, user_id: &str) -> Result<Option<Profile>>;
    async fn upsert(&self, profile: &Profile) -> Result<()>;
}
