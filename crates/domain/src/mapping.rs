//! Null-safe column mapping
//!
//! Row mappers in the infrastructure layer route every nullable column
//! through these helpers so each one lands on a documented default. The
//! helpers are total: no input makes them fail.

use std::str::FromStr;

use crate::constants::{DEFAULT_CALENDAR_ID, DEFAULT_CURRENCY, DEFAULT_POSTER_SKIN};

/// `None`, empty and whitespace-only text all become `default`.
pub fn text_or(value: Option<String>, default: &str) -> String {
    non_empty(value).unwrap_or_else(|| default.to_string())
}

/// Trims the value and drops it when nothing is left.
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// `poster_skin`: null or empty → `"clean"`.
pub fn poster_skin(value: Option<String>) -> String {
    text_or(value, DEFAULT_POSTER_SKIN)
}

/// `currency`: null or empty → `"USD"`, otherwise upper-cased.
pub fn currency(value: Option<String>) -> String {
    non_empty(value).map(|c| c.to_uppercase()).unwrap_or_else(|| DEFAULT_CURRENCY.to_string())
}

/// `calendar_id`: null or empty → `"primary"`.
pub fn calendar_id(value: Option<String>) -> String {
    text_or(value, DEFAULT_CALENDAR_ID)
}

/// Status columns: null or unrecognised text → `default`.
pub fn status_or<T: FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|v| v.parse().ok()).unwrap_or(default)
}

/// Integer flags: null → false, any non-zero → true.
pub fn flag(value: Option<i64>) -> bool {
    value.unwrap_or(0) != 0
}

/// Counters: null or negative → 0.
pub fn count(value: Option<i64>) -> u32 {
    value.and_then(|v| u32::try_from(v).ok()).unwrap_or(0)
}
