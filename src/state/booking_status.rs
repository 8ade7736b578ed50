//! Booking lifecycle status and poll-and-diff reconciliation

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Lifecycle status reported by the booking API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BookingStatus {
    Pending,
    OnProgress,
    Completed,
    Cancelled,
    Other(String),
}

impl BookingStatus {
    /// Whether the service timer may be started in this status
    pub fn permits_timer(&self) -> bool {
        matches!(self, BookingStatus::OnProgress)
    }

    /// Whether the booking has finished and its timer must be released
    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Completed | BookingStatus::Cancelled)
    }

    pub fn as_str(&self) -> &str {
        match self {
            BookingStatus::Pending => "Pending",
            BookingStatus::OnProgress => "On Progress",
            BookingStatus::Completed => "Completed",
            BookingStatus::Cancelled => "Cancelled",
            BookingStatus::Other(raw) => raw,
        }
    }
}

impl From<String> for BookingStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "Pending" => BookingStatus::Pending,
            "On Progress" => BookingStatus::OnProgress,
            "Completed" => BookingStatus::Completed,
            "Cancelled" => BookingStatus::Cancelled,
            _ => BookingStatus::Other(raw),
        }
    }
}

impl From<BookingStatus> for String {
    fn from(status: BookingStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tracks the last known booking status and diffs each poll against it.
///
/// The reconciler only ever asks for the timer to be stopped; starting is
/// left to the operator.
#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    last_known: Option<BookingStatus>,
}

impl Reconciler {
    pub fn new(initial: Option<BookingStatus>) -> Self {
        Self { last_known: initial }
    }

    pub fn last_known(&self) -> Option<&BookingStatus> {
        self.last_known.as_ref()
    }

    /// Remember `status`, returning whether it differs from the last one seen
    pub fn record(&mut self, status: &BookingStatus) -> bool {
        if self.last_known.as_ref() == Some(status) {
            debug!("Booking status unchanged: {}", status);
            return false;
        }

        info!(
            "Booking status changed: {} -> {}",
            self.last_known
                .as_ref()
                .map(BookingStatus::as_str)
                .unwrap_or("unknown"),
            status
        );
        self.last_known = Some(status.clone());
        true
    }

    /// A running timer must be released on every poll that reports a finished booking
    pub fn should_stop(status: &BookingStatus, timer_running: bool) -> bool {
        status.is_terminal() && timer_running
    }
}
