//! Scheduling infrastructure for background calendar work
//!
//! Schedulers follow the same runtime rules:
//! - Explicit lifecycle management (start/stop)
//! - Join handles for spawned tasks
//! - Cancellation token support
//! - Timeout wrapping on all async operations

pub mod calendar_scheduler;
pub mod error;

pub use calendar_scheduler::{CalendarJobs, CalendarScheduler, CalendarSchedulerConfig};
pub use error::{SchedulerError, SchedulerResult};
