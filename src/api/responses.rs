//! API response structures

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    session::BookingSession,
    state::{BookingStatus, TimerPhase, TimerState},
};

/// Timer fields as shown to clients
#[derive(Debug, Clone, Serialize)]
pub struct TimerView {
    pub is_running: bool,
    pub remaining_seconds: u64,
    pub total_seconds: u64,
    pub phase: TimerPhase,
    pub display: String,
}

impl From<TimerState> for TimerView {
    fn from(state: TimerState) -> Self {
        Self {
            is_running: state.is_running,
            remaining_seconds: state.remaining_seconds,
            total_seconds: state.total_seconds,
            phase: state.phase(),
            display: state.display(),
        }
    }
}

/// Response for every per-booking endpoint
#[derive(Debug, Clone, Serialize)]
pub struct TimerResponse {
    pub booking_id: String,
    pub booking_status: BookingStatus,
    pub variant: Option<String>,
    /// Absent when the variant carries no duration
    pub timer: Option<TimerView>,
    pub timestamp: DateTime<Utc>,
}

impl TimerResponse {
    pub fn from_session(session: &BookingSession) -> Self {
        Self {
            booking_id: session.booking_id().to_string(),
            booking_status: session.status(),
            variant: session.variant().map(str::to_string),
            timer: session.timer_state().map(TimerView::from),
            timestamp: Utc::now(),
        }
    }
}

/// Error body returned alongside a non-2xx status
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl ErrorResponse {
    pub fn new(message: String) -> Self {
        Self {
            status: "error".to_string(),
            message,
            timestamp: Utc::now(),
        }
    }
}

/// Server status with the bookings currently held open
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub sessions: Vec<String>,
    pub uptime: String,
    pub started_at: DateTime<Utc>,
    pub port: u16,
    pub host: String,
}

/// Health check response
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    /// Create a new health response
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
