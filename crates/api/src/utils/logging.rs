use std::time::Duration;

use encore_domain::EncoreError;
use tracing::{info, warn};

/// Log the outcome of a command execution with structured fields.
///
/// # Parameters
/// * `command` - Logical command identifier (e.g. `"gigs::create_gig"`).
/// * `elapsed` - Duration the command execution took.
/// * `success` - Whether the command completed successfully.
///
/// Callers must avoid forwarding sensitive values in `command`.
#[inline]
pub fn log_command_execution(command: &str, elapsed: Duration, success: bool) {
    let duration_ms = elapsed.as_millis() as u64;

    if success {
        info!(command, duration_ms, "command_execution_success");
    } else {
        warn!(command, duration_ms, "command_execution_failure");
    }
}

/// Convert an `EncoreError` into a stable label suitable for logging and
/// response bodies.
#[inline]
pub fn error_label(error: &EncoreError) -> &'static str {
    match error {
        EncoreError::Database(_) => "database",
        EncoreError::Config(_) => "config",
        EncoreError::Network(_) => "network",
        EncoreError::Auth(_) => "auth",
        EncoreError::PermissionDenied(_) => "permission_denied",
        EncoreError::NotFound(_) => "not_found",
        EncoreError::InvalidInput(_) => "invalid_input",
        EncoreError::Conflict(_) => "conflict",
        EncoreError::TokenRevoked(_) => "token_revoked",
        EncoreError::Provider(_) => "provider",
        EncoreError::Storage(_) => "storage",
        EncoreError::Internal(_) => "internal",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_snake_case() {
        assert_eq!(error_label(&EncoreError::NotFound("gig".into())), "not_found");
        assert_eq!(error_label(&EncoreError::TokenRevoked("gone".into())), "token_revoked");
        assert_eq!(error_label(&EncoreError::PermissionDenied("no".into())), "permission_denied");
    }
}
