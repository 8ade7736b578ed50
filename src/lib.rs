//! Booking Timer - a durable service-duration countdown for marketplace bookings
//!
//! This library tracks how long a provider has left on an in-progress
//! booking, survives process restarts by persisting the timer's start time,
//! and releases the timer once the remote booking reports completion.

pub mod api;
pub mod clock;
pub mod config;
pub mod duration;
pub mod error;
pub mod services;
pub mod session;
pub mod state;
pub mod store;
pub mod tasks;
pub mod utils;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use api::create_router;
pub use config::Config;
pub use session::{BookingSession, SessionDeps, SessionIntervals};
pub use state::{AppState, TimerController, TimerState};
pub use utils::signals::shutdown_signal;
