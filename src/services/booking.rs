//! Booking API client

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{duration::duration_seconds, error::SourceError, state::BookingStatus};

/// The booking fields the timer cares about
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    #[serde(alias = "_id", alias = "bookingId", deserialize_with = "string_or_number")]
    pub id: String,
    pub status: BookingStatus,
    /// Service variant label, e.g. `"90 Menit"`
    #[serde(default, alias = "variant_name", alias = "variantName")]
    pub variant: Option<String>,
}

impl Booking {
    /// Service duration encoded in the variant label, `0` when none applies
    pub fn duration_seconds(&self) -> u64 {
        self.variant.as_deref().map(duration_seconds).unwrap_or(0)
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(i64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(text) => text,
        Id::Number(number) => number.to_string(),
    })
}

/// Responses arrive either bare or wrapped in a `data` envelope
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BookingEnvelope {
    Wrapped { data: Booking },
    Bare(Booking),
}

impl From<BookingEnvelope> for Booking {
    fn from(envelope: BookingEnvelope) -> Self {
        match envelope {
            BookingEnvelope::Wrapped { data } => data,
            BookingEnvelope::Bare(booking) => booking,
        }
    }
}

/// Remote source of booking lifecycle status
#[async_trait]
pub trait BookingStatusSource: Send + Sync {
    async fn fetch_booking(&self, booking_id: &str) -> Result<Booking, SourceError>;
}

/// Booking source backed by the marketplace REST API
#[derive(Debug, Clone)]
pub struct HttpBookingSource {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpBookingSource {
    pub fn new(
        base_url: impl Into<String>,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    pub fn booking_url(&self, booking_id: &str) -> String {
        format!("{}/bookings/{}", self.base_url, booking_id)
    }
}

#[async_trait]
impl BookingStatusSource for HttpBookingSource {
    async fn fetch_booking(&self, booking_id: &str) -> Result<Booking, SourceError> {
        let url = self.booking_url(booking_id);
        debug!("Fetching booking from {}", url);

        let mut request = self.client.get(&url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        match response.status() {
            StatusCode::NOT_FOUND => Err(SourceError::NotFound {
                booking_id: booking_id.to_string(),
            }),
            status if !status.is_success() => Err(SourceError::UnexpectedStatus {
                booking_id: booking_id.to_string(),
                status: status.as_u16(),
            }),
            _ => {
                let envelope: BookingEnvelope = response.json().await?;
                Ok(envelope.into())
            }
        }
    }
}
