//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for Encore
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum EncoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// The calendar provider rejected the refresh token (`invalid_grant`).
    #[error("Calendar access revoked: {0}")]
    TokenRevoked(String),

    /// Verbatim failure reported by an external provider.
    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl EncoreError {
    /// Database error carrying the backend message, or `fallback` when the
    /// backend gave nothing usable.
    pub fn database(message: impl Into<String>, fallback: &str) -> Self {
        Self::Database(message_or(message, fallback))
    }

    /// Message text without the variant prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::Database(msg)
            | Self::Config(msg)
            | Self::Network(msg)
            | Self::Auth(msg)
            | Self::PermissionDenied(msg)
            | Self::NotFound(msg)
            | Self::InvalidInput(msg)
            | Self::Conflict(msg)
            | Self::TokenRevoked(msg)
            | Self::Provider(msg)
            | Self::Storage(msg)
            | Self::Internal(msg) => msg,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub fn is_token_revoked(&self) -> bool {
        matches!(self, Self::TokenRevoked(_))
    }
}

/// Returns the trimmed backend message, or `fallback` if it is empty.
pub fn message_or(message: impl Into<String>, fallback: &str) -> String {
    let message = message.into();
    if message.trim().is_empty() {
        fallback.to_string()
    } else {
        message.trim().to_string()
    }
}

/// Result type alias for Encore operations
pub type Result<T> = std::result::Result<T, EncoreError>;
