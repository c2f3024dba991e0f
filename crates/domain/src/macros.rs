//! Macro for implementing Display and FromStr for status enums
//!
//! Status enums are stored as lowercase text columns. The macro keeps the
//! textual form in one place so repositories, services and the HTTP layer all
//! agree on it.
//!
//! # Example
//!
//! ```rust
//! use encore_domain::impl_domain_status_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum SoundcheckState {
//!     Scheduled,
//!     Done,
//!     Skipped,
//! }
//!
//! impl_domain_status_conversions!(SoundcheckState {
//!     Scheduled => "scheduled",
//!     Done => "done",
//!     Skipped => "skipped",
//! });
//!
//! assert_eq!(SoundcheckState::Done.to_string(), "done");
//! assert_eq!("SKIPPED".parse::<SoundcheckState>(), Ok(SoundcheckState::Skipped));
//! ```

/// Implements Display, FromStr and `as_str` for status enums
///
/// Parsing is case-insensitive and ignores surrounding whitespace. The error
/// names the enum so a bad database value is easy to trace.
#[macro_export]
macro_rules! impl_domain_status_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl $enum_name {
            /// Stable textual representation used in storage and the API.
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $str,)+
                }
            }
        }

        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}
