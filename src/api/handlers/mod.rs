//! REST endpoint handlers organized by resource.

pub mod orders;
pub mod payments;
pub mod system;
pub mod tickets;
pub mod webhooks;

use axum::Router;

use crate::app_state::AppState;

/// Composes all resource routes under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(payments::routes())
        .merge(orders::routes())
        .merge(tickets::routes())
}
