//! Domain types and models

pub mod activity;
pub mod band;
pub mod calendar;
pub mod dashboard;
pub mod gig;
pub mod gig_pack;
pub mod notification;
pub mod readiness;
pub mod role;

pub use activity::*;
pub use band::*;
pub use calendar::*;
pub use dashboard::*;
pub use gig::*;
pub use gig_pack::*;
pub use notification::*;
pub use readiness::*;
pub use role::*;

/// Time-ordered identifier for new rows.
pub fn new_id() -> String {
    uuid::Uuid::now_v7().to_string()
}
