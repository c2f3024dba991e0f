//! Application constants
//!
//! Centralized location for domain-level defaults and limits.

// Field defaults applied when a nullable column is empty
pub const DEFAULT_POSTER_SKIN: &str = "clean";
pub const DEFAULT_CURRENCY: &str = "USD";
pub const DEFAULT_CALENDAR_ID: &str = "primary";
pub const UNTITLED_GIG: &str = "Untitled gig";
pub const IMPORTED_OWNER_ROLE: &str = "Leader";

// Readiness weighting
pub const READINESS_SONGS_WEIGHT: f64 = 0.4;
pub const READINESS_CHECKLIST_WEIGHT: f64 = 0.6;

// Calendar
pub const GOOGLE_PROVIDER: &str = "google";
pub const TOKEN_REFRESH_THRESHOLD_SECS: i64 = 300;
pub const DEFAULT_GIG_DURATION_MINUTES: i64 = 180;
pub const WATCH_RENEWAL_WINDOW_HOURS: i64 = 24;

// Uploads
pub const SETLIST_PDF_MAX_BYTES: usize = 10 * 1024 * 1024;
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

// Paging
pub const PAST_GIGS_DEFAULT_LIMIT: u32 = 20;
pub const PAST_GIGS_MAX_LIMIT: u32 = 100;
pub const ACTIVITY_DEFAULT_LIMIT: u32 = 50;
pub const NOTIFICATIONS_DEFAULT_LIMIT: u32 = 100;
