//! Timer state structure and display helpers

use serde::Serialize;

/// Countdown state for one booking's service duration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct TimerState {
    pub is_running: bool,
    pub remaining_seconds: u64,
    pub total_seconds: u64,
}

/// UI-facing phase derived from a [`TimerState`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerPhase {
    NotStarted,
    Running,
    Stopped,
    Expired,
}

impl TimerState {
    /// Create a ready timer with the full budget remaining
    pub fn ready(total_seconds: u64) -> Self {
        Self {
            is_running: false,
            remaining_seconds: total_seconds,
            total_seconds,
        }
    }

    /// Create a running timer
    pub fn running(remaining_seconds: u64, total_seconds: u64) -> Self {
        Self {
            is_running: true,
            remaining_seconds: remaining_seconds.min(total_seconds),
            total_seconds,
        }
    }

    /// Create a timer that has run out
    pub fn expired(total_seconds: u64) -> Self {
        Self {
            is_running: false,
            remaining_seconds: 0,
            total_seconds,
        }
    }

    pub fn phase(&self) -> TimerPhase {
        if self.is_running {
            TimerPhase::Running
        } else if self.remaining_seconds == self.total_seconds {
            TimerPhase::NotStarted
        } else if self.remaining_seconds == 0 {
            TimerPhase::Expired
        } else {
            TimerPhase::Stopped
        }
    }

    /// Remaining time as `MM:SS`, or `HH:MM:SS` from one hour up
    pub fn display(&self) -> String {
        let hours = self.remaining_seconds / 3600;
        let minutes = (self.remaining_seconds % 3600) / 60;
        let seconds = self.remaining_seconds % 60;

        if hours > 0 {
            format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
        } else {
            format!("{:02}:{:02}", minutes, seconds)
        }
    }
}
