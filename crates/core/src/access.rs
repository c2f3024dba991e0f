//! Gig-level access control
//!
//! SQLite has no row-level security, so every service resolves the gig
//! through [`GigAccess`] before touching it.

use std::sync::Arc;

use encore_domain::{EncoreError, Gig, GigRole, InvitationStatus, Result};

use crate::gigs::ports::GigRepository;
use crate::roles::ports::RoleRepository;

/// How the acting user relates to a gig.
#[derive(Debug, Clone, PartialEq)]
pub struct GigMembership {
    pub gig: Gig,
    pub is_owner: bool,
    pub role: Option<GigRole>,
}

#[derive(Clone)]
pub struct GigAccess {
    gigs: Arc<dyn GigRepository>,
    roles: Arc<dyn RoleRepository>,
}

impl GigAccess {
    pub fn new(gigs: Arc<dyn GigRepository>, roles: Arc<dyn RoleRepository>) -> Self {
        Self { gigs, roles }
    }

    pub fn gigs(&self) -> &Arc<dyn GigRepository> {
        &self.gigs
    }

    pub fn roles(&self) -> &Arc<dyn RoleRepository> {
        &self.roles
    }

    /// Load a gig the user must own.
    pub async fn owned(&self, user_id: &str, gig_id: &str) -> Result<Gig> {
        let gig = self.load(gig_id).await?;
        if !gig.is_owned_by(user_id) {
            return Err(EncoreError::PermissionDenied(
                "Only the gig owner can do that".to_string(),
            ));
        }
        Ok(gig)
    }

    /// Load a gig the user owns or holds a non-declined role on.
    pub async fn visible(&self, user_id: &str, gig_id: &str) -> Result<GigMembership> {
        let gig = self.load(gig_id).await?;
        let role = self.roles.find_for_musician(gig_id, user_id).await?;

        if gig.is_owned_by(user_id) {
            return Ok(GigMembership { gig, is_owner: true, role });
        }

        match role {
            Some(role) if role.invitation_status != InvitationStatus::Declined => {
                Ok(GigMembership { gig, is_owner: false, role: Some(role) })
            }
            _ => Err(EncoreError::PermissionDenied(
                "You do not have access to this gig".to_string(),
            )),
        }
    }

    /// Load a role and the gig it belongs to.
    pub async fn role_with_gig(&self, role_id: &str) -> Result<(GigRole, Gig)> {
        let role = self
            .roles
            .find_by_id(role_id)
            .await?
            .ok_or_else(|| EncoreError::NotFound("Role not found".to_string()))?;
        let gig = self.load(&role.gig_id).await?;
        Ok((role, gig))
    }

    async fn load(&self, gig_id: &str) -> Result<Gig> {
        self.gigs
            .find_by_id(gig_id)
            .await?
            .ok_or_else(|| EncoreError::NotFound("Gig not found".to_string()))
    }
}

/// User ids to notify about a gig: the owner plus every active musician with
/// an account. `actor` is left out.
pub fn gig_audience(gig: &Gig, roles: &[GigRole], actor: &str) -> Vec<String> {
    let mut audience: Vec<String> = Vec::new();
    let candidates = std::iter::once(gig.owner_id.as_str()).chain(
        roles
            .iter()
            .filter(|role| role.invitation_status.is_active())
            .filter_map(|role| role.musician_id.as_deref()),
    );
    for user_id in candidates {
        if user_id != actor && !audience.iter().any(|existing| existing == user_id) {
            audience.push(user_id.to_string());
        }
    }
    audience
}
