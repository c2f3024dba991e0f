//! Shared test helpers for `encore-core` integration tests.
//!
//! In-memory ports plus a [`Harness`] that wires every service the way the
//! API does, so tests can focus on behaviour instead of setup.

#![allow(dead_code)]

pub mod calendar;
pub mod repositories;

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use encore_core::{
    ActivityLogger, CalendarService, CalendarSettings, DashboardService, GigAccess, GigPackService,
    GigService, NotificationService, PaymentService, ReadinessService, RoleService,
};
use encore_domain::{Gig, GigRole, GigStatus, InvitationStatus, NewGig, NewRole};

use self::calendar::{FakeCalendarProvider, RecordingEmailSender};
use self::repositories::*;

pub const OWNER: &str = "owner-1";
pub const MUSICIAN: &str = "musician-1";

pub struct Harness {
    pub gigs: Arc<InMemoryGigs>,
    pub roles: Arc<InMemoryRoles>,
    pub activity: Arc<InMemoryActivity>,
    pub notifications: Arc<InMemoryNotifications>,
    pub dashboard: Arc<FailingDashboard>,
    pub pack: Arc<InMemoryGigPack>,
    pub readiness: Arc<InMemoryReadiness>,
    pub storage: Arc<InMemoryStorage>,
    pub connections: Arc<InMemoryConnections>,
    pub sync_log: Arc<InMemorySyncLog>,
    pub profiles: Arc<InMemoryProfiles>,
    pub provider: Arc<FakeCalendarProvider>,
    pub email: Arc<RecordingEmailSender>,
}

impl Harness {
    pub fn new() -> Self {
        let gigs = Arc::new(InMemoryGigs::default());
        let roles = Arc::new(InMemoryRoles::new(gigs.clone()));
        Self {
            gigs,
            roles,
            activity: Arc::new(InMemoryActivity::default()),
            notifications: Arc::new(InMemoryNotifications::default()),
            dashboard: Arc::new(FailingDashboard),
            pack: Arc::new(InMemoryGigPack::default()),
            readiness: Arc::new(InMemoryReadiness::default()),
            storage: Arc::new(InMemoryStorage::default()),
            connections: Arc::new(InMemoryConnections::default()),
            sync_log: Arc::new(InMemorySyncLog::default()),
            profiles: Arc::new(InMemoryProfiles::default()),
            provider: Arc::new(FakeCalendarProvider::default()),
            email: Arc::new(RecordingEmailSender::default()),
        }
    }

    pub fn access(&self) -> GigAccess {
        GigAccess::new(self.gigs.clone(), self.roles.clone())
    }

    pub fn activity_logger(&self) -> ActivityLogger {
        ActivityLogger::new(self.activity.clone(), self.access())
    }

    pub fn notification_service(&self) -> NotificationService {
        NotificationService::new(self.notifications.clone())
    }

    pub fn gig_service(&self) -> GigService {
        GigService::new(self.access(), self.activity_logger(), self.notification_service())
    }

    pub fn role_service(&self) -> RoleService {
        RoleService::new(self.access(), self.activity_logger(), self.notification_service())
    }

    pub fn payment_service(&self) -> PaymentService {
        PaymentService::new(self.access(), self.activity_logger(), self.notification_service())
    }

    pub fn readiness_service(&self) -> ReadinessService {
        ReadinessService::new(self.readiness.clone(), self.access())
    }

    pub fn dashboard_service(&self) -> DashboardService {
        DashboardService::new(self.dashboard.clone(), self.access())
    }

    pub fn gig_pack_service(&self) -> GigPackService {
        GigPackService::new(
            self.pack.clone(),
            self.storage.clone(),
            self.access(),
            self.activity_logger(),
        )
    }

    pub fn calendar_service(&self) -> CalendarService {
        self.calendar_service_with(CalendarSettings::default())
    }

    pub fn calendar_service_with(&self, settings: CalendarSettings) -> CalendarService {
        CalendarService::new(
            self.provider.clone(),
            self.connections.clone(),
            self.sync_log.clone(),
            self.access(),
            self.activity_logger(),
            self.notification_service(),
        )
        .with_settings(settings)
        .with_profiles(self.profiles.clone())
        .with_email_sender(self.email.clone())
    }

    /// Store a gig directly, bypassing the service.
    pub fn seed_gig(&self, owner_id: &str, title: &str, date: NaiveDate) -> Gig {
        let mut gig = Gig::from_new(owner_id, new_gig(title, date), chrono::Utc::now());
        gig.status = GigStatus::Confirmed;
        self.gigs.put(gig.clone());
        gig
    }

    pub fn seed_role(
        &self,
        gig_id: &str,
        musician_id: Option<&str>,
        email: Option<&str>,
        status: InvitationStatus,
    ) -> GigRole {
        let mut role = GigRole::from_new(
            gig_id,
            NewRole {
                musician_id: musician_id.map(ToOwned::to_owned),
                musician_email: email.map(ToOwned::to_owned),
                musician_name: None,
                role_name: "Bass".into(),
                agreed_fee_cents: Some(15_000),
                notes: None,
            },
            chrono::Utc::now(),
        );
        role.invitation_status = status;
        self.roles.put(role.clone());
        role
    }
}

pub fn new_gig(title: &str, date: NaiveDate) -> NewGig {
    NewGig {
        title: title.into(),
        date,
        start_time: NaiveTime::from_hms_opt(20, 0, 0),
        end_time: NaiveTime::from_hms_opt(23, 0, 0),
        location_name: Some("The Blue Room".into()),
        location_address: None,
        status: None,
        notes: None,
        poster_skin: None,
        fee_cents: Some(60_000),
        currency: None,
        band_id: None,
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}
