//! Calendar background jobs on a cron schedule.
//!
//! Two jobs share one [`JobScheduler`]: re-syncing imported gigs for every
//! sync-enabled connection, and renewing push-notification channels before
//! they lapse. Each run is wrapped in a timeout; start and stop are explicit
//! and the monitor task is joined on shutdown.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use encore_core::CalendarService;
use encore_domain::{Result as DomainResult, SchedulerConfig};
use tokio::task::JoinHandle;
use tokio_cron_scheduler::{Job, JobScheduler};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::scheduling::error::{SchedulerError, SchedulerResult};

/// Work the scheduler triggers.
#[async_trait]
pub trait CalendarJobs: Send + Sync + 'static {
    /// Returns the number of connections synced.
    async fn sync_all(&self) -> DomainResult<u32>;

    /// Returns the number of watches renewed.
    async fn renew_watches(&self) -> DomainResult<u32>;
}

#[async_trait]
impl CalendarJobs for CalendarService {
    async fn sync_all(&self) -> DomainResult<u32> {
        self.sync_all_connections().await
    }

    async fn renew_watches(&self) -> DomainResult<u32> {
        self.renew_expiring_watches().await
    }
}

/// Configuration for the calendar scheduler.
#[derive(Debug, Clone)]
pub struct CalendarSchedulerConfig {
    /// Cron expression (with seconds) for the imported-gig sync.
    pub sync_cron: String,
    /// Cron expression (with seconds) for watch renewal.
    pub watch_renewal_cron: String,
    /// Timeout applied to a single job execution.
    pub job_timeout: Duration,
    pub start_timeout: Duration,
    pub stop_timeout: Duration,
    /// Timeout for awaiting the monitor task join handle.
    pub join_timeout: Duration,
}

impl Default for CalendarSchedulerConfig {
    fn default() -> Self {
        Self::from(&SchedulerConfig::default())
    }
}

impl From<&SchedulerConfig> for CalendarSchedulerConfig {
    fn from(config: &SchedulerConfig) -> Self {
        Self {
            sync_cron: config.sync_cron.clone(),
            watch_renewal_cron: config.watch_renewal_cron.clone(),
            job_timeout: Duration::from_secs(300),
            start_timeout: Duration::from_secs(5),
            stop_timeout: Duration::from_secs(5),
            join_timeout: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum JobKind {
    Sync,
    WatchRenewal,
}

impl JobKind {
    fn name(self) -> &'static str {
        match self {
            Self::Sync => "calendar_sync",
            Self::WatchRenewal => "watch_renewal",
        }
    }
}

/// Calendar scheduler with explicit lifecycle management.
pub struct CalendarScheduler {
    scheduler: Option<JobScheduler>,
    config: CalendarSchedulerConfig,
    monitor_handle: Option<JoinHandle<()>>,
    cancellation: CancellationToken,
    jobs: Arc<dyn CalendarJobs>,
}

impl CalendarScheduler {
    pub fn new(jobs: Arc<dyn CalendarJobs>, config: CalendarSchedulerConfig) -> Self {
        Self {
            scheduler: None,
            config,
            monitor_handle: None,
            cancellation: CancellationToken::new(),
            jobs,
        }
    }

    /// Start the scheduler, spawning the monitoring task.
    #[instrument(skip(self))]
    pub async fn start(&mut self) -> SchedulerResult<()> {
        if self.is_running() {
            return Err(SchedulerError::AlreadyRunning);
        }

        self.cancellation = CancellationToken::new();

        let scheduler_instance = self.build_scheduler().await?;
        let start_timeout = self.config.start_timeout;

        tokio::time::timeout(start_timeout, scheduler_instance.start())
            .await
            .map_err(|source| SchedulerError::Timeout { duration: start_timeout, source })?
            .map_err(|source| SchedulerError::StartFailed { source })?;

        self.scheduler = Some(scheduler_instance);

        let cancel = self.cancellation.clone();
        self.monitor_handle = Some(tokio::spawn(Self::monitor_task(cancel)));

        info!(
            sync_cron = %self.config.sync_cron,
            watch_renewal_cron = %self.config.watch_renewal_cron,
            "Calendar scheduler started"
        );
        Ok(())
    }

    /// Stop the scheduler and wait for the monitor task to finish.
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> SchedulerResult<()> {
        let Some(mut scheduler) = self.scheduler.take() else {
            return Err(SchedulerError::NotRunning);
        };

        self.cancellation.cancel();

        let stop_timeout = self.config.stop_timeout;
        tokio::time::timeout(stop_timeout, scheduler.shutdown())
            .await
            .map_err(|source| SchedulerError::Timeout { duration: stop_timeout, source })?
            .map_err(|source| SchedulerError::StopFailed { source })?;

        if let Some(handle) = self.monitor_handle.take() {
            let join_timeout = self.config.join_timeout;
            tokio::time::timeout(join_timeout, handle)
                .await
                .map_err(|source| SchedulerError::Timeout { duration: join_timeout, source })??;
        }

        info!("Calendar scheduler stopped");
        self.cancellation = CancellationToken::new();
        Ok(())
    }

    /// Returns true when a scheduler instance is active.
    pub fn is_running(&self) -> bool {
        self.scheduler.is_some()
    }

    async fn build_scheduler(&self) -> SchedulerResult<JobScheduler> {
        let scheduler =
            JobScheduler::new().await.map_err(|source| SchedulerError::CreationFailed { source })?;

        for (kind, cron) in [
            (JobKind::Sync, self.config.sync_cron.as_str()),
            (JobKind::WatchRenewal, self.config.watch_renewal_cron.as_str()),
        ] {
            let job = self.build_job(kind, cron)?;
            let job_id = job.guid();
            scheduler
                .add(job)
                .await
                .map_err(|source| SchedulerError::JobRegistrationFailed { job: kind.name(), source })?;
            debug!(job = kind.name(), cron, job_id = %job_id, "Registered calendar job");
        }

        Ok(scheduler)
    }

    fn build_job(&self, kind: JobKind, cron: &str) -> SchedulerResult<Job> {
        let jobs = self.jobs.clone();
        let job_timeout = self.config.job_timeout;

        Job::new_async(cron, move |_id, _lock| {
            let jobs = jobs.clone();
            Box::pin(async move {
                run_job(kind, jobs, job_timeout).await;
            })
        })
        .map_err(|source| SchedulerError::JobRegistrationFailed { job: kind.name(), source })
    }

    async fn monitor_task(cancel: CancellationToken) {
        cancel.cancelled().await;
        debug!("Calendar scheduler monitor cancelled");
    }
}

async fn run_job(kind: JobKind, jobs: Arc<dyn CalendarJobs>, job_timeout: Duration) {
    let started = Instant::now();
    let work = async {
        match kind {
            JobKind::Sync => jobs.sync_all().await,
            JobKind::WatchRenewal => jobs.renew_watches().await,
        }
    };

    match tokio::time::timeout(job_timeout, work).await {
        Ok(Ok(count)) => {
            info!(
                job = kind.name(),
                count,
                duration_ms = started.elapsed().as_millis() as u64,
                "Calendar job finished"
            );
        }
        Ok(Err(err)) => {
            error!(job = kind.name(), error = %err, "Calendar job failed");
        }
        Err(_) => {
            warn!(job = kind.name(), timeout_secs = job_timeout.as_secs(), "Calendar job timed out");
        }
    }
}

impl Drop for CalendarScheduler {
    fn drop(&mut self) {
        if self.is_running() {
            warn!("CalendarScheduler dropped while running; cancelling tasks");
            self.cancellation.cancel();
        }
    }
}
