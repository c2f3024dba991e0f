//! External service integrations

pub mod email;
pub mod google;

pub use email::{build_email_sender, HttpEmailSender, LogEmailSender};
pub use google::{build_calendar_provider, DisabledCalendarProvider, GoogleCalendarProvider};
