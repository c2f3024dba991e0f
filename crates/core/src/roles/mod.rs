//! Roles and the invitation lifecycle

pub mod ports;
mod service;

pub use service::{is_valid_email, RoleService};
