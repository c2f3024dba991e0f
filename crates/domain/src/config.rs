//! Application configuration structures
//!
//! Every section implements `Default`, so a partial TOML/JSON file only has to
//! name the values it changes.

use serde::{Deserialize, Serialize};

/// Root configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub google: GoogleCalendarConfig,
    pub storage: StorageConfig,
    pub email: EmailConfig,
    pub scheduler: SchedulerConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
    pub pool_size: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: "encore.db".to_string(), pool_size: 8 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    /// Externally reachable base URL, used for OAuth redirects and webhooks.
    pub public_base_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
            public_base_url: "http://localhost:8080".to_string(),
        }
    }
}

/// Google Calendar OAuth client and API endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleCalendarConfig {
    pub client_id: String,
    pub client_secret: Option<String>,
    pub redirect_uri: String,
    pub auth_url: String,
    pub token_url: String,
    pub api_base_url: String,
    /// Push-notification receiver. Watches are skipped when unset.
    pub webhook_url: Option<String>,
    /// IANA zone used to turn gig dates and times into calendar instants.
    pub time_zone: String,
}

impl GoogleCalendarConfig {
    pub fn is_configured(&self) -> bool {
        !self.client_id.trim().is_empty()
    }
}

impl Default for GoogleCalendarConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: None,
            redirect_uri: "http://localhost:8080/api/calendar/oauth/callback".to_string(),
            auth_url: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
            token_url: "https://oauth2.googleapis.com/token".to_string(),
            api_base_url: "https://www.googleapis.com/calendar/v3".to_string(),
            webhook_url: None,
            time_zone: "UTC".to_string(),
        }
    }
}

/// Local object storage for uploaded files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub root_dir: String,
    pub public_base_url: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root_dir: "uploads".to_string(),
            public_base_url: "http://localhost:8080/files".to_string(),
        }
    }
}

/// Transactional e-mail used as the invitation fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    pub enabled: bool,
    pub api_url: String,
    pub api_key: Option<String>,
    pub from_address: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_url: "https://api.resend.com/emails".to_string(),
            api_key: None,
            from_address: "gigs@encore.local".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub enabled: bool,
    pub sync_cron: String,
    pub watch_renewal_cron: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sync_cron: "0 */30 * * * *".to_string(),
            watch_renewal_cron: "0 0 */6 * * *".to_string(),
        }
    }
}
