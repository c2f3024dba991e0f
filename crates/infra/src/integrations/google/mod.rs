//! Google Calendar integration
//!
//! OAuth with PKCE, event CRUD, and push-notification channels against the
//! Calendar v3 REST API.

pub mod calendar;
mod disabled;
pub mod oauth;
mod wire;

use std::sync::Arc;

use encore_core::CalendarProvider;
use encore_domain::{GoogleCalendarConfig, Result};
use tracing::warn;

pub use calendar::GoogleCalendarProvider;
pub use disabled::DisabledCalendarProvider;
pub use oauth::{email_from_id_token, GoogleOAuth};

/// Google provider when a client id is configured, otherwise a provider that
/// rejects every call.
pub fn build_calendar_provider(config: &GoogleCalendarConfig) -> Result<Arc<dyn CalendarProvider>> {
    if !config.is_configured() {
        warn!("Google client id not set; calendar features are disabled");
        return Ok(Arc::new(DisabledCalendarProvider));
    }
    Ok(Arc::new(GoogleCalendarProvider::new(config)?))
}
