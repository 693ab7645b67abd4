//! Route tree for the relay.
//!
//! ```text
//! /health        service + database health
//! /callbacks     recent callback log, newest first
//! /uplink        uplink webhook (persist, decode reading, forward telemetry)
//! /downlink      downlink webhook (persist, respond with encoded payload)
//! ```

pub mod callbacks;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the full route tree (without middleware, see `router`).
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(callbacks::router())
}
