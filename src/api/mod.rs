//! HTTP API module
//!
//! This module contains all HTTP endpoint handlers and response structures.

pub mod handlers;
pub mod responses;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use handlers::*;

/// Create the HTTP router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/bookings/:booking_id/session",
            post(open_session_handler).delete(close_session_handler),
        )
        .route("/bookings/:booking_id/timer", get(timer_handler))
        .route("/bookings/:booking_id/timer/start", post(start_timer_handler))
        .route("/bookings/:booking_id/timer/stop", post(stop_timer_handler))
        .route("/status", get(status_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
