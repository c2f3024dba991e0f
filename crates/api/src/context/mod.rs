//! Application context - dependency injection container

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use encore_core::{
    ActivityLogger, ActivityRepository, BandRepository, BandService, CalendarConnectionRepository,
    CalendarService, CalendarSettings, DashboardRepository, DashboardService, GigAccess,
    GigPackRepository, GigPackService, GigRepository, GigService, NotificationRepository,
    NotificationService, ObjectStorage, PaymentService, ProfileRepository, ProfileService,
    ReadinessRepository, ReadinessService, RoleRepository, RoleService, SyncLogRepository,
};
use encore_domain::{AuthorizationRequest, Config, EncoreError, Result};
use encore_infra::{
    build_calendar_provider, build_email_sender, CalendarScheduler, CalendarSchedulerConfig,
    DbManager, LocalObjectStorage, SqliteActivityRepository, SqliteBandRepository,
    SqliteCalendarConnectionRepository, SqliteDashboardRepository, SqliteGigPackRepository,
    SqliteGigRepository, SqliteNotificationRepository, SqliteProfileRepository,
    SqliteReadinessRepository, SqliteRoleRepository, SqliteSyncLogRepository,
};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::utils::health::{ComponentHealth, HealthStatus};

/// How long an OAuth `state` stays redeemable.
const AUTHORIZATION_TTL: Duration = Duration::from_secs(600);

/// Consent flow started by a user and not yet completed.
struct PendingAuthorization {
    user_id: String,
    pkce_verifier: String,
    started_at: Instant,
}

/// Authorization waiting for its callback, resolved by `state`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedeemedAuthorization {
    pub user_id: String,
    pub pkce_verifier: String,
}

/// Application context holding every service the routes call.
pub struct AppContext {
    pub config: Config,
    pub db: Arc<DbManager>,
    pub gigs: GigService,
    pub roles: RoleService,
    pub readiness: ReadinessService,
    pub activity: ActivityLogger,
    pub notifications: NotificationService,
    pub dashboard: DashboardService,
    pub payments: PaymentService,
    pub gig_pack: GigPackService,
    pub bands: BandService,
    pub profiles: ProfileService,
    pub calendar: Arc<CalendarService>,
    pub storage: Arc<LocalObjectStorage>,
    pending_authorizations: Mutex<HashMap<String, PendingAuthorization>>,
    scheduler: tokio::sync::Mutex<Option<CalendarScheduler>>,
}

impl AppContext {
    /// Build the context: open the database, apply the schema, and wire the
    /// repositories into the services. Background jobs are not started here;
    /// see [`AppContext::start_background_jobs`].
    pub async fn new(config: Config) -> Result<Self> {
        let db = Arc::new(DbManager::new(&config.database.path, config.database.pool_size)?);
        db.run_migrations()?;

        let gig_repo: Arc<dyn GigRepository> = Arc::new(SqliteGigRepository::new(db.clone()));
        let role_repo: Arc<dyn RoleRepository> = Arc::new(SqliteRoleRepository::new(db.clone()));
        let activity_repo: Arc<dyn ActivityRepository> =
            Arc::new(SqliteActivityRepository::new(db.clone()));
        let notification_repo: Arc<dyn NotificationRepository> =
            Arc::new(SqliteNotificationRepository::new(db.clone()));
        let readiness_repo: Arc<dyn ReadinessRepository> =
            Arc::new(SqliteReadinessRepository::new(db.clone()));
        let dashboard_repo: Arc<dyn DashboardRepository> =
            Arc::new(SqliteDashboardRepository::new(db.clone()));
        let pack_repo: Arc<dyn GigPackRepository> =
            Arc::new(SqliteGigPackRepository::new(db.clone()));
        let band_repo: Arc<dyn BandRepository> = Arc::new(SqliteBandRepository::new(db.clone()));
        let profile_repo: Arc<dyn ProfileRepository> =
            Arc::new(SqliteProfileRepository::new(db.clone()));
        let connection_repo: Arc<dyn CalendarConnectionRepository> =
            Arc::new(SqliteCalendarConnectionRepository::new(db.clone()));
        let sync_log_repo: Arc<dyn SyncLogRepository> =
            Arc::new(SqliteSyncLogRepository::new(db.clone()));

        let storage = Arc::new(LocalObjectStorage::from_config(&config.storage));
        let object_storage: Arc<dyn ObjectStorage> = storage.clone();

        let access = GigAccess::new(gig_repo, role_repo);
        let activity = ActivityLogger::new(activity_repo, access.clone());
        let notifications = NotificationService::new(notification_repo);

        let provider = build_calendar_provider(&config.google)?;
        let email_sender = build_email_sender(&config.email)?;
        let calendar = CalendarService::new(
            provider,
            connection_repo,
            sync_log_repo,
            access.clone(),
            activity.clone(),
            notifications.clone(),
        )
        .with_settings(CalendarSettings {
            time_zone: config.google.time_zone.clone(),
            webhook_url: config.google.webhook_url.clone(),
            ..CalendarSettings::default()
        })
        .with_profiles(profile_repo.clone())
        .with_email_sender(email_sender);

        info!(
            database = %db.path().display(),
            storage = %storage.root().display(),
            calendar_configured = config.google.is_configured(),
            email_enabled = config.email.enabled,
            "application context initialised"
        );

        Ok(Self {
            gigs: GigService::new(access.clone(), activity.clone(), notifications.clone()),
            roles: RoleService::new(access.clone(), activity.clone(), notifications.clone()),
            readiness: ReadinessService::new(readiness_repo, access.clone()),
            dashboard: DashboardService::new(dashboard_repo, access.clone()),
            payments: PaymentService::new(access.clone(), activity.clone(), notifications.clone()),
            gig_pack: GigPackService::new(pack_repo, object_storage, access, activity.clone()),
            bands: BandService::new(band_repo),
            profiles: ProfileService::new(profile_repo),
            calendar: Arc::new(calendar),
            activity,
            notifications,
            storage,
            config,
            db,
            pending_authorizations: Mutex::new(HashMap::new()),
            scheduler: tokio::sync::Mutex::new(None),
        })
    }

    /// Start the calendar scheduler when enabled and Google is configured.
    pub async fn start_background_jobs(&self) -> Result<()> {
        if !self.config.scheduler.enabled {
            info!("calendar scheduler disabled by configuration");
            return Ok(());
        }
        if !self.config.google.is_configured() {
            info!("calendar scheduler not started: Google Calendar is not configured");
            return Ok(());
        }

        let mut slot = self.scheduler.lock().await;
        if slot.is_some() {
            return Ok(());
        }
        let mut scheduler = CalendarScheduler::new(
            self.calendar.clone(),
            CalendarSchedulerConfig::from(&self.config.scheduler),
        );
        scheduler.start().await?;
        *slot = Some(scheduler);
        Ok(())
    }

    /// Stop background jobs; safe to call when none are running.
    pub async fn shutdown(&self) -> Result<()> {
        let scheduler = self.scheduler.lock().await.take();
        if let Some(mut scheduler) = scheduler {
            scheduler.stop().await?;
        }
        info!("application context shut down");
        Ok(())
    }

    pub async fn scheduler_running(&self) -> bool {
        self.scheduler.lock().await.as_ref().is_some_and(CalendarScheduler::is_running)
    }

    // ------------------------------------------------------------------
    // OAuth state
    // ------------------------------------------------------------------

    /// Start the consent flow for `user_id` and remember its PKCE verifier
    /// under the returned `state`.
    pub fn begin_calendar_authorization(&self, user_id: &str) -> Result<AuthorizationRequest> {
        let request = self.calendar.authorization_url(user_id)?;
        let mut pending = self.pending_authorizations.lock();
        pending.retain(|_, entry| entry.started_at.elapsed() < AUTHORIZATION_TTL);
        pending.insert(
            request.state.clone(),
            PendingAuthorization {
                user_id: user_id.to_string(),
                pkce_verifier: request.pkce_verifier.clone(),
                started_at: Instant::now(),
            },
        );
        debug!(user_id, pending = pending.len(), "calendar authorization pending");
        Ok(request)
    }

    /// Redeem a callback `state` exactly once.
    pub fn redeem_calendar_authorization(&self, state: &str) -> Result<RedeemedAuthorization> {
        let entry = self.pending_authorizations.lock().remove(state);
        match entry {
            Some(entry) if entry.started_at.elapsed() < AUTHORIZATION_TTL => {
                Ok(RedeemedAuthorization {
                    user_id: entry.user_id,
                    pkce_verifier: entry.pkce_verifier,
                })
            }
            Some(_) => Err(EncoreError::Auth("Authorization request expired".into())),
            None => Err(EncoreError::Auth("Unknown or already used authorization state".into())),
        }
    }

    // ------------------------------------------------------------------
    // Health
    // ------------------------------------------------------------------

    /// Check health of the database, storage directory and integrations.
    pub async fn health_check(&self) -> HealthStatus {
        let mut status = HealthStatus::new()
            .add_component(self.check_database_health().await)
            .add_component(self.check_storage_health().await);

        let calendar = if self.config.google.is_configured() {
            ComponentHealth::healthy("calendar")
        } else {
            ComponentHealth::healthy("calendar").note("not configured")
        };
        status = status.add_component(calendar);

        let scheduler = if self.scheduler_running().await {
            ComponentHealth::healthy("scheduler")
        } else {
            ComponentHealth::healthy("scheduler").note("not running")
        };
        status = status.add_component(scheduler);

        status.calculate_score();
        status
    }

    async fn check_database_health(&self) -> ComponentHealth {
        let db = self.db.clone();
        match tokio::task::spawn_blocking(move || db.health_check()).await {
            Ok(Ok(())) => ComponentHealth::healthy("database"),
            Ok(Err(e)) => {
                warn!(error = %e, "database health check failed");
                ComponentHealth::unhealthy("database", format!("query failed: {}", e))
            }
            Err(e) => {
                tracing::error!(error = %e, "database health check task panicked");
                ComponentHealth::unhealthy("database", format!("task panic: {}", e))
            }
        }
    }

    async fn check_storage_health(&self) -> ComponentHealth {
        let root = self.storage.root().to_path_buf();
        match tokio::fs::create_dir_all(&root).await {
            Ok(()) => ComponentHealth::healthy("storage"),
            Err(e) => {
                warn!(error = %e, root = %root.display(), "storage directory unavailable");
                ComponentHealth::unhealthy("storage", format!("{}: {}", root.display(), e))
            }
        }
    }
}
