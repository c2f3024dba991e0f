//! HTTP route handlers, one module per area

mod bands;
mod calendar;
mod dashboard;
mod gig_pack;
mod gigs;
mod health;
mod notifications;
mod readiness;
mod roles;

use std::sync::Arc;

use axum::Router;

use crate::context::AppContext;

pub use gigs::{CancelledGig, GigView};

/// Every route, sharing the application context as state.
pub fn router(ctx: Arc<AppContext>) -> Router {
    Router::new()
        .merge(health::routes())
        .merge(gigs::routes())
        .merge(roles::routes())
        .merge(readiness::routes())
        .merge(notifications::routes())
        .merge(dashboard::routes())
        .merge(gig_pack::routes())
        .merge(bands::routes())
        .merge(calendar::routes())
        .with_state(ctx)
}
