//! Gig service - create, edit, cancel and delete gigs

use std::sync::Arc;

use chrono::Utc;
use encore_domain::{
    ActivityType, EncoreError, Gig, GigStatus, GigUpdate, NewGig, NewNotification,
    NotificationKind, Result,
};
use serde_json::json;
use tracing::{info, instrument};

use super::ports::GigRepository;
use crate::access::{gig_audience, GigAccess, GigMembership};
use crate::activity::ActivityLogger;
use crate::notifications::NotificationService;

pub struct GigService {
    access: GigAccess,
    activity: ActivityLogger,
    notifications: NotificationService,
}

impl GigService {
    pub fn new(
        access: GigAccess,
        activity: ActivityLogger,
        notifications: NotificationService,
    ) -> Self {
        Self { access, activity, notifications }
    }

    fn gigs(&self) -> &Arc<dyn GigRepository> {
        self.access.gigs()
    }

    #[instrument(skip(self, input), fields(owner_id = %owner_id))]
    pub async fn create_gig(&self, owner_id: &str, input: NewGig) -> Result<Gig> {
        if input.title.trim().is_empty() {
            return Err(EncoreError::InvalidInput("Gig title is required".to_string()));
        }
        validate_times(&input.start_time, &input.end_time)?;

        let gig = Gig::from_new(owner_id, input, Utc::now());
        self.gigs().insert(&gig).await?;

        self.activity
            .record(
                &gig.id,
                owner_id,
                ActivityType::GigCreated,
                format!("Created gig \"{}\"", gig.title),
                json!({ "date": gig.date, "status": gig.status }),
            )
            .await;

        info!(gig_id = %gig.id, "gig created");
        Ok(gig)
    }

    pub async fn get_gig(&self, user_id: &str, gig_id: &str) -> Result<GigMembership> {
        self.access.visible(user_id, gig_id).await
    }

    pub async fn list_owned_gigs(&self, owner_id: &str) -> Result<Vec<Gig>> {
        self.gigs().list_by_owner(owner_id).await
    }

    #[instrument(skip(self, update), fields(owner_id = %owner_id, gig_id = %gig_id))]
    pub async fn update_gig(&self, owner_id: &str, gig_id: &str, update: GigUpdate) -> Result<Gig> {
        let mut gig = self.access.owned(owner_id, gig_id).await?;
        if update.is_empty() {
            return Ok(gig);
        }
        if update.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(EncoreError::InvalidInput("Gig title cannot be empty".to_string()));
        }

        let previous_status = gig.status;
        let schedule_changed = update.touches_schedule();
        update.apply(&mut gig, Utc::now());
        validate_times(&gig.start_time, &gig.end_time)?;
        self.gigs().update(&gig).await?;

        let (activity_type, description) = if gig.status != previous_status {
            (
                ActivityType::StatusChanged,
                format!("Status changed from {previous_status} to {}", gig.status),
            )
        } else {
            (ActivityType::GigUpdated, format!("Updated gig \"{}\"", gig.title))
        };
        self.activity
            .record(&gig.id, owner_id, activity_type, description, json!({}))
            .await;

        if schedule_changed || gig.status != previous_status {
            self.notify_members(&gig, owner_id, NotificationKind::GigUpdated, "Gig updated")
                .await?;
        }

        Ok(gig)
    }

    #[instrument(skip(self), fields(owner_id = %owner_id, gig_id = %gig_id))]
    pub async fn cancel_gig(&self, owner_id: &str, gig_id: &str) -> Result<Gig> {
        let mut gig = self.access.owned(owner_id, gig_id).await?;
        if gig.is_cancelled() {
            return Ok(gig);
        }

        gig.status = GigStatus::Cancelled;
        gig.updated_at = Utc::now();
        self.gigs().update(&gig).await?;

        self.activity
            .record(
                &gig.id,
                owner_id,
                ActivityType::GigCancelled,
                format!("Cancelled gig \"{}\"", gig.title),
                json!({}),
            )
            .await;
        self.notify_members(&gig, owner_id, NotificationKind::GigCancelled, "Gig cancelled")
            .await?;

        info!(gig_id = %gig.id, "gig cancelled");
        Ok(gig)
    }

    pub async fn delete_gig(&self, owner_id: &str, gig_id: &str) -> Result<()> {
        let gig = self.access.owned(owner_id, gig_id).await?;
        if !self.gigs().delete(&gig.id).await? {
            return Err(EncoreError::NotFound("Gig not found".to_string()));
        }
        info!(gig_id = %gig.id, "gig deleted");
        Ok(())
    }

    async fn notify_members(
        &self,
        gig: &Gig,
        actor: &str,
        kind: NotificationKind,
        title: &str,
    ) -> Result<()> {
        let roles = self.access.roles().list_by_gig(&gig.id).await?;
        let audience = gig_audience(gig, &roles, actor);
        let body = format!("{} on {}", gig.title, gig.date);
        self.notifications
            .fan_out(actor, &audience, |recipient| {
                NewNotification::new(recipient, kind, title)
                    .with_body(body.clone())
                    .for_gig(&gig.id)
                    .dedupe_key(format!("{kind}:{}:{recipient}", gig.id))
            })
            .await;
        Ok(())
    }
}

fn validate_times(
    start: &Option<chrono::NaiveTime>,
    end: &Option<chrono::NaiveTime>,
) -> Result<()> {
    if end.is_some() && start.is_none() {
        return Err(EncoreError::InvalidInput("An end time needs a start time".to_string()));
    }
    Ok(())
}
