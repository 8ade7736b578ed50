//! Shared fakes for unit tests

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;

use crate::{
    error::SourceError,
    services::{Booking, BookingStatusSource},
    state::BookingStatus,
};

/// Booking source whose answers can be changed between polls
#[derive(Default)]
pub struct FakeSource {
    bookings: Mutex<HashMap<String, Booking>>,
}

impl FakeSource {
    pub fn with(id: &str, status: BookingStatus, variant: Option<&str>) -> Arc<Self> {
        let source = Arc::new(Self::default());
        source.set(id, status, variant);
        source
    }

    pub fn set(&self, id: &str, status: BookingStatus, variant: Option<&str>) {
        self.bookings.lock().unwrap().insert(
            id.to_string(),
            Booking {
                id: id.to_string(),
                status,
                variant: variant.map(str::to_string),
            },
        );
    }
}

#[async_trait]
impl BookingStatusSource for FakeSource {
    async fn fetch_booking(&self, booking_id: &str) -> Result<Booking, SourceError> {
        self.bookings
            .lock()
            .unwrap()
            .get(booking_id)
            .cloned()
            .ok_or_else(|| SourceError::NotFound {
                booking_id: booking_id.to_string(),
            })
    }
}

/// Delays every fetch of `slow_id` before answering from the inner source
pub struct SlowSource {
    pub inner: Arc<FakeSource>,
    pub slow_id: String,
    pub delay: Duration,
}

#[async_trait]
impl BookingStatusSource for SlowSource {
    async fn fetch_booking(&self, booking_id: &str) -> Result<Booking, SourceError> {
        if booking_id == self.slow_id {
            tokio::time::sleep(self.delay).await;
        }
        self.inner.fetch_booking(booking_id).await
    }
}
