//! Testing helpers shared by the Encore crates
//!
//! - [`temp`]: self-cleaning temporary directories
//! - [`database`]: throwaway pooled SQLite databases (requires `platform`)

#[cfg(feature = "platform")]
pub mod database;
pub mod temp;

#[cfg(feature = "platform")]
pub use database::TestDatabase;
pub use temp::TempDir;
