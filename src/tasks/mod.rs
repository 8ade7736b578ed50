//! Background tasks module
//!
//! This module contains the per-booking loops that run alongside the HTTP server.

pub mod countdown;
pub mod status_poll;

// Re-export main functions
pub use countdown::{countdown_task, TimerEvent};
pub use status_poll::{reconcile_once, status_poll_task};
