//! Object storage for uploaded gig files

mod local;

pub use local::LocalObjectStorage;
