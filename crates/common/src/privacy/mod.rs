//! Privacy helpers
//!
//! Musician e-mail addresses flow through calendar sync, invitation and
//! scheduler logs. They are logged as a short salted hash so log lines can be
//! correlated without exposing the address.

use sha2::{Digest, Sha256};

const EMAIL_HASH_SALT: &[u8] = b"encore-log-email-salt";

/// Replace an e-mail address with a stable, non-reversible tag.
///
/// The address is trimmed and lower-cased first so the same inbox always maps
/// to the same tag.
pub fn redact_email(email: &str) -> String {
    let normalized = email.trim().to_lowercase();
    let mut hasher = Sha256::new();
    hasher.update(EMAIL_HASH_SALT);
    hasher.update(normalized.as_bytes());
    let digest = hasher.finalize();
    format!("email_hash={}", hex::encode(&digest[..8]))
}

/// Redact an optional address, keeping `None` visible in logs.
pub fn redact_optional_email(email: Option<&str>) -> String {
    email.map_or_else(|| "none".to_string(), redact_email)
}
