//! State management module
//!
//! This module contains the timer state machine, booking status tracking,
//! and the application-wide session registry.

pub mod app_state;
pub mod booking_status;
pub mod timer_controller;
pub mod timer_state;

// Re-export main types
pub use app_state::AppState;
pub use booking_status::{BookingStatus, Reconciler};
pub use timer_controller::{TickOutcome, TimerController};
pub use timer_state::{TimerPhase, TimerState};
