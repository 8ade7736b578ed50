//! External collaborators
//!
//! This module contains the client for the remote booking API.

pub mod booking;

// Re-export main types
pub use booking::{Booking, BookingStatusSource, HttpBookingSource};
