//! Google Calendar integration
//!
//! - [`ports`]: provider, connection store, sync log and e-mail seams
//! - [`events`]: gig and event conversions in the calendar time zone
//! - [`reconcile`]: attendee list reconciliation
//! - [`conflicts`]: overlap detection between gigs and events
//! - [`service`]: the use cases

pub mod conflicts;
pub mod events;
pub mod ports;
pub mod reconcile;
mod service;

pub use conflicts::find_conflicts;
pub use reconcile::reconcile_attendees;
pub use service::{CalendarService, CalendarSettings};
