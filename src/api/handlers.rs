//! HTTP endpoint handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use tracing::{error, info, warn};

use super::responses::{ErrorResponse, HealthResponse, StatusResponse, TimerResponse};
use crate::{
    error::{SessionError, SourceError},
    state::AppState,
};

pub type ApiError = (StatusCode, Json<ErrorResponse>);

/// Map a session error onto an HTTP status, logging it at a fitting level
fn api_error(booking_id: &str, err: SessionError) -> ApiError {
    let status = match &err {
        SessionError::NotFound { .. } | SessionError::Source(SourceError::NotFound { .. }) => {
            StatusCode::NOT_FOUND
        }
        SessionError::Source(_) => StatusCode::BAD_GATEWAY,
        SessionError::NoTimer { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        SessionError::StartRejected { .. } | SessionError::AlreadyRunning { .. } => {
            StatusCode::CONFLICT
        }
    };

    if status.is_server_error() {
        error!("Request for booking {} failed: {}", booking_id, err);
    } else {
        warn!("Request for booking {} refused: {}", booking_id, err);
    }

    (status, Json(ErrorResponse::new(err.to_string())))
}

/// Handle POST /bookings/:id/session - Open (or reuse) the booking's session
pub async fn open_session_handler(
    State(state): State<Arc<AppState>>,
    Path(booking_id): Path<String>,
) -> Result<Json<TimerResponse>, ApiError> {
    let session = state
        .open_session(&booking_id)
        .await
        .map_err(|e| api_error(&booking_id, e))?;

    Ok(Json(TimerResponse::from_session(&session)))
}

/// Handle DELETE /bookings/:id/session - Close the session and cancel its loops
pub async fn close_session_handler(
    State(state): State<Arc<AppState>>,
    Path(booking_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state
        .close_session(&booking_id)
        .await
        .map_err(|e| api_error(&booking_id, e))?;

    info!("Session for booking {} closed by request", booking_id);
    Ok(StatusCode::NO_CONTENT)
}

/// Handle GET /bookings/:id/timer - Current timer and booking status
pub async fn timer_handler(
    State(state): State<Arc<AppState>>,
    Path(booking_id): Path<String>,
) -> Result<Json<TimerResponse>, ApiError> {
    let session = state
        .session(&booking_id)
        .await
        .map_err(|e| api_error(&booking_id, e))?;

    Ok(Json(TimerResponse::from_session(&session)))
}

/// Handle POST /bookings/:id/timer/start - Start the service timer
pub async fn start_timer_handler(
    State(state): State<Arc<AppState>>,
    Path(booking_id): Path<String>,
) -> Result<Json<TimerResponse>, ApiError> {
    let session = state
        .session(&booking_id)
        .await
        .map_err(|e| api_error(&booking_id, e))?;

    session
        .start_timer()
        .await
        .map_err(|e| api_error(&booking_id, e))?;

    Ok(Json(TimerResponse::from_session(&session)))
}

/// Handle POST /bookings/:id/timer/stop - Stop the service timer
pub async fn stop_timer_handler(
    State(state): State<Arc<AppState>>,
    Path(booking_id): Path<String>,
) -> Result<Json<TimerResponse>, ApiError> {
    let session = state
        .session(&booking_id)
        .await
        .map_err(|e| api_error(&booking_id, e))?;

    session
        .stop_timer()
        .await
        .map_err(|e| api_error(&booking_id, e))?;

    Ok(Json(TimerResponse::from_session(&session)))
}

/// Handle GET /status - Return server status and open sessions
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        sessions: state.session_ids().await,
        uptime: state.get_uptime(),
        started_at: state.started_at,
        port: state.port,
        host: state.host.clone(),
    })
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
