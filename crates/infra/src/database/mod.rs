//! Database implementations

pub mod activity_repository;
pub mod band_repository;
pub mod calendar_repository;
pub mod dashboard_repository;
pub mod gig_pack_repository;
pub mod gig_repository;
pub mod manager;
pub mod notification_repository;
pub mod readiness_repository;
pub mod role_repository;

pub use activity_repository::SqliteActivityRepository;
pub use band_repository::{SqliteBandRepository, SqliteProfileRepository};
pub use calendar_repository::{SqliteCalendarConnectionRepository, SqliteSyncLogRepository};
pub use dashboard_repository::SqliteDashboardRepository;
pub use gig_pack_repository::SqliteGigPackRepository;
pub use gig_repository::SqliteGigRepository;
pub use manager::DbManager;
pub use notification_repository::SqliteNotificationRepository;
pub use readiness_repository::SqliteReadinessRepository;
pub use role_repository::SqliteRoleRepository;
