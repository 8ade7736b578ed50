//! Error types shared across the crate

use thiserror::Error;

use crate::state::BookingStatus;

/// Errors raised by a key-value store backend
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("store document is not valid JSON: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("store lock poisoned: {0}")]
    Poisoned(String),
}

/// Errors raised while fetching a booking from the remote API
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("booking request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("booking {booking_id} not found")]
    NotFound { booking_id: String },

    #[error("booking API returned {status} for booking {booking_id}")]
    UnexpectedStatus { booking_id: String, status: u16 },
}

/// Errors surfaced by a booking session to its caller
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("no timer applies to booking {booking_id}")]
    NoTimer { booking_id: String },

    #[error("timer cannot start while booking status is {status}")]
    StartRejected { status: BookingStatus },

    #[error("timer for booking {booking_id} is already running")]
    AlreadyRunning { booking_id: String },

    #[error("no open session for booking {booking_id}")]
    NotFound { booking_id: String },
}
