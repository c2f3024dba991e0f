//! Role service - lineup management and invitation responses

use chrono::Utc;
use encore_domain::{
    ActivityType, EncoreError, GigRole, Invitation, InvitationStatus, NewNotification, NewRole,
    NotificationKind, Result, RoleUpdate,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::json;
use tracing::{info, instrument};

use crate::access::GigAccess;
use crate::activity::ActivityLogger;
use crate::notifications::NotificationService;

static EMAIL_PATTERN: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").ok());

/// Loose shape check: something@domain.tld without whitespace.
pub fn is_valid_email(email: &str) -> bool {
    match EMAIL_PATTERN.as_ref() {
        Some(pattern) => pattern.is_match(email.trim()),
        None => email.contains('@'),
    }
}

/// One role per musician per gig, matched by account or e-mail.
fn ensure_unique_musician(existing: &[GigRole], role: &GigRole) -> Result<()> {
    let duplicate = existing.iter().filter(|other| other.id != role.id).any(|other| {
        (role.musician_id.is_some() && other.musician_id == role.musician_id)
            || (role.email_key().is_some() && other.email_key() == role.email_key())
    });
    if duplicate {
        return Err(EncoreError::Conflict("This musician already has a role on the gig".to_string()));
    }
    Ok(())
}

pub struct RoleService {
    access: GigAccess,
    activity: ActivityLogger,
    notifications: NotificationService,
}

impl RoleService {
    pub fn new(
        access: GigAccess,
        activity: ActivityLogger,
        notifications: NotificationService,
    ) -> Self {
        Self { access, activity, notifications }
    }

    #[instrument(skip(self, input), fields(owner_id = %owner_id, gig_id = %gig_id))]
    pub async fn add_role(&self, owner_id: &str, gig_id: &str, input: NewRole) -> Result<GigRole> {
        let gig = self.access.owned(owner_id, gig_id).await?;

        let email = input.musician_email.as_deref().map(str::trim).filter(|e| !e.is_empty());
        let musician_id = input.musician_id.as_deref().map(str::trim).filter(|m| !m.is_empty());
        if email.is_none() && musician_id.is_none() {
            return Err(EncoreError::InvalidInput(
                "A musician e-mail or account is required".to_string(),
            ));
        }
        if let Some(email) = email {
            if !is_valid_email(email) {
                return Err(EncoreError::InvalidInput(format!("Invalid e-mail address: {email}")));
            }
        }

        let existing = self.access.roles().list_by_gig(&gig.id).await?;
        let role = GigRole::from_new(&gig.id, input, Utc::now());
        ensure_unique_musician(&existing, &role)?;

        self.access.roles().insert(&role).await?;
        self.activity
            .record(
                &gig.id,
                owner_id,
                ActivityType::RoleAdded,
                format!("Added {} as {}", role.display_name(), role.role_name),
                json!({ "roleId": role.id }),
            )
            .await;

        info!(role_id = %role.id, "role added");
        Ok(role)
    }

    pub async fn update_role(
        &self,
        owner_id: &str,
        role_id: &str,
        update: RoleUpdate,
    ) -> Result<GigRole> {
        let (mut role, gig) = self.access.role_with_gig(role_id).await?;
        self.access.owned(owner_id, &gig.id).await?;

        if let Some(email) = update.musician_email.as_deref().map(str::trim) {
            if !email.is_empty() && !is_valid_email(email) {
                return Err(EncoreError::InvalidInput(format!("Invalid e-mail address: {email}")));
            }
        }

        let email_changed = update.musician_email.is_some();
        update.apply(&mut role, Utc::now());
        if email_changed {
            let existing = self.access.roles().list_by_gig(&gig.id).await?;
            ensure_unique_musician(&existing, &role)?;
        }
        self.access.roles().update(&role).await?;
        self.activity
            .record(
                &gig.id,
                owner_id,
                ActivityType::RoleUpdated,
                format!("Updated role {}", role.role_name),
                json!({ "roleId": role.id }),
            )
            .await;
        Ok(role)
    }

    pub async fn remove_role(&self, owner_id: &str, role_id: &str) -> Result<()> {
        let (role, gig) = self.access.role_with_gig(role_id).await?;
        self.access.owned(owner_id, &gig.id).await?;

        if !self.access.roles().delete(&role.id).await? {
            return Err(EncoreError::NotFound("Role not found".to_string()));
        }
        self.activity
            .record(
                &gig.id,
                owner_id,
                ActivityType::RoleRemoved,
                format!("Removed {} ({})", role.display_name(), role.role_name),
                json!({ "roleId": role.id }),
            )
            .await;
        Ok(())
    }

    /// Move a role along the invitation lifecycle. The musician holding the
    /// role or the gig owner may respond.
    #[instrument(skip(self), fields(user_id = %user_id, role_id = %role_id, status = %status))]
    pub async fn respond(
        &self,
        user_id: &str,
        role_id: &str,
        status: InvitationStatus,
    ) -> Result<GigRole> {
        let (mut role, gig) = self.access.role_with_gig(role_id).await?;
        if !role.belongs_to(user_id) && !gig.is_owned_by(user_id) {
            return Err(EncoreError::PermissionDenied(
                "Only the invited musician can respond".to_string(),
            ));
        }

        let previous = role.invitation_status;
        if previous == status {
            return Ok(role);
        }
        if !previous.can_transition_to(status) {
            return Err(EncoreError::InvalidInput(format!(
                "Cannot change invitation from {previous} to {status}"
            )));
        }

        let now = Utc::now();
        role.invitation_status = status;
        role.updated_at = now;
        if status == InvitationStatus::Invited {
            role.invited_at = Some(now);
        } else {
            role.responded_at = Some(now);
        }
        self.access.roles().update(&role).await?;

        self.activity
            .record(
                &gig.id,
                user_id,
                ActivityType::StatusChanged,
                format!("{} is now {status}", role.display_name()),
                json!({ "roleId": role.id, "from": previous, "to": status }),
            )
            .await;

        if status.notifies_owner() && !gig.is_owned_by(user_id) {
            let (kind, verb) = match status {
                InvitationStatus::Accepted => (NotificationKind::InvitationAccepted, "accepted"),
                InvitationStatus::Declined => (NotificationKind::InvitationDeclined, "declined"),
                _ => (NotificationKind::NeedsSub, "needs a sub for"),
            };
            self.notifications
                .notify(
                    NewNotification::new(
                        &gig.owner_id,
                        kind,
                        format!("{} {verb} {}", role.display_name(), gig.title),
                    )
                    .with_body(format!("{} on {}", role.role_name, gig.date))
                    .for_gig(&gig.id)
                    .dedupe_key(format!("{kind}:{}:{}", gig.id, role.id)),
                )
                .await;
        }

        Ok(role)
    }

    /// Roles on a gig the user can see.
    pub async fn list_roles(&self, user_id: &str, gig_id: &str) -> Result<Vec<GigRole>> {
        self.access.visible(user_id, gig_id).await?;
        self.access.roles().list_by_gig(gig_id).await
    }

    /// Every invitation addressed to the user, soonest gig first.
    pub async fn list_invitations(&self, user_id: &str) -> Result<Vec<Invitation>> {
        let mut invitations = self.access.roles().list_invitations(user_id).await?;
        invitations.sort_by(|a, b| {
            (a.gig.date, a.gig.start_time).cmp(&(b.gig.date, b.gig.start_time))
        });
        Ok(invitations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shape() {
        assert!(is_valid_email("bass@example.com"));
        assert!(is_valid_email("  keys@band.co.uk "));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("two words@example.com"));
    }
}
