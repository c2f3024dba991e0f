//! Port interfaces for role / invitation persistence

use async_trait::async_trait;
use encore_domain::{GigRole, Invitation, Result};

#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// Insert a role. A second role for the same musician on the same gig
    /// fails with `Conflict`.
    async fn insert(&self, role: &GigRole) -> Result<()>;

    async fn find_by_id(&self, id: &str) -> Result<Option<GigRole>>;

    async fn update(&self, role: &GigRole) -> Result<()>;

    async fn delete(&self, id: &str) -> Result<bool>;

    /// Roles on a gig, in creation order.
    async fn list_by_gig(&self, gig_id: &str) -> Result<Vec<GigRole>>;

    async fn find_for_musician(&self, gig_id: &str, musician_id: &str) -> Result<Option<GigRole>>;

    /// Every role held by `musician_id`, joined with its gig.
    async fn list_invitations(&self, musician_id: &str) -> Result<Vec<Invitation>>;
}
