//! # Encore Core
//!
//! Business rules for gig management, free of infrastructure.
//!
//! This crate contains:
//! - Port interfaces (traits) for persistence, the calendar provider, object
//!   storage and e-mail delivery
//! - Services implementing every use case over those ports
//! - Pure helpers (readiness scoring, dashboard filtering, attendee
//!   reconciliation, conflict detection) that the services and tests share
//!
//! ## Architecture Principles
//! - Only depends on `encore-domain` and `encore-common`
//! - No database, HTTP, or platform code
//! - Access control lives here; storage has no row-level security

pub mod access;
pub mod activity;
pub mod bands;
pub mod calendar;
pub mod dashboard;
pub mod gig_pack;
pub mod gigs;
pub mod notifications;
pub mod payments;
pub mod readiness;
pub mod roles;

pub use access::GigAccess;
pub use activity::ports::ActivityRepository;
pub use activity::ActivityLogger;
pub use bands::ports::{BandRepository, ProfileRepository};
pub use bands::{BandService, ProfileService};
pub use calendar::ports::{
    CalendarConnectionRepository, CalendarProvider, EmailSender, InvitationEmail,
    SyncLogRepository,
};
pub use calendar::{CalendarService, CalendarSettings};
pub use dashboard::ports::DashboardRepository;
pub use dashboard::DashboardService;
pub use gig_pack::ports::{GigPackRepository, ObjectStorage};
pub use gig_pack::GigPackService;
pub use gigs::ports::GigRepository;
pub use gigs::GigService;
pub use notifications::ports::NotificationRepository;
pub use notifications::NotificationService;
pub use payments::PaymentService;
pub use readiness::ports::ReadinessRepository;
pub use readiness::{compute_readiness_score, ReadinessService};
pub use roles::ports::RoleRepository;
pub use roles::RoleService;
