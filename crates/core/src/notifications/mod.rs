//! In-app notifications
//!
//! Delivery goes through `create_or_update` so repeated events for the same
//! gig collapse into one row per recipient. When that path fails the
//! notification is inserted plainly; when both fail the error is logged and
//! the caller carries on.

pub mod ports;

use std::sync::Arc;

use chrono::Utc;
use encore_domain::constants::NOTIFICATIONS_DEFAULT_LIMIT;
use encore_domain::{EncoreError, NewNotification, Notification, Result};
use tracing::{debug, error, warn};

use self::ports::NotificationRepository;

#[derive(Clone)]
pub struct NotificationService {
    repository: Arc<dyn NotificationRepository>,
}

impl NotificationService {
    pub fn new(repository: Arc<dyn NotificationRepository>) -> Self {
        Self { repository }
    }

    /// Deliver one notification. Returns whether it was stored.
    pub async fn notify(&self, notification: NewNotification) -> bool {
        let row = notification.into_notification(Utc::now());

        match self.repository.create_or_update(&row).await {
            Ok(_) => {
                debug!(user_id = %row.user_id, kind = %row.kind, "notification stored");
                true
            }
            Err(primary) => {
                warn!(
                    user_id = %row.user_id,
                    kind = %row.kind,
                    error = %primary,
                    "create_or_update failed; falling back to plain insert"
                );
                match self.repository.insert(&row).await {
                    Ok(()) => true,
                    Err(fallback) => {
                        error!(
                            user_id = %row.user_id,
                            kind = %row.kind,
                            error = %fallback,
                            "notification dropped"
                        );
                        false
                    }
                }
            }
        }
    }

    /// Notify each recipient except `actor`. `build` receives the recipient
    /// id. Returns how many notifications were stored.
    pub async fn fan_out<F>(&self, actor: &str, recipients: &[String], build: F) -> u32
    where
        F: Fn(&str) -> NewNotification,
    {
        let mut delivered = 0;
        for recipient in recipients.iter().filter(|r| r.as_str() != actor) {
            if self.notify(build(recipient)).await {
                delivered += 1;
            }
        }
        delivered
    }

    pub async fn list(
        &self,
        user_id: &str,
        unread_only: bool,
        limit: Option<u32>,
    ) -> Result<Vec<Notification>> {
        let limit = limit.filter(|l| *l > 0).unwrap_or(NOTIFICATIONS_DEFAULT_LIMIT);
        self.repository.list(user_id, unread_only, limit).await
    }

    pub async fn mark_read(&self, user_id: &str, notification_id: &str) -> Result<()> {
        if self.repository.mark_read(user_id, notification_id).await? {
            Ok(())
        } else {
            Err(EncoreError::NotFound("Notification not found".to_string()))
        }
    }

    pub async fn mark_all_read(&self, user_id: &str) -> Result<u32> {
        self.repository.mark_all_read(user_id).await
    }

    pub async fn unread_count(&self, user_id: &str) -> Result<u32> {
        self.repository.unread_count(user_id).await
    }
}
