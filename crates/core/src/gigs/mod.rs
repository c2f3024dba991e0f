//! Gig lifecycle

pub mod ports;
mod service;

pub use service::GigService;
