use std::time::Duration;

use async_trait::async_trait;
use raahi_types::TripState;

/// Booking endpoint used when none is configured.
pub const DEFAULT_BOOKING_URL: &str = "http://localhost:6969/createTrip";

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("booking request failed: {0}")]
    Request(String),

    #[error("booking endpoint returned {status}")]
    Rejected { status: u16 },
}

/// Creates the trip in the downstream booking system.
#[async_trait]
pub trait TripBooker: Send + Sync {
    async fn create_trip(&self, state: &TripState) -> Result<(), BookingError>;
}

/// Posts the full trip state as JSON. Any 2xx status is a booked trip.
///
/// No retries: a failed booking is retried only when the caller confirms
/// again on a later turn.
#[derive(Debug, Clone)]
pub struct HttpBooker {
    client: reqwest::Client,
    url: String,
}

impl HttpBooker {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, BookingError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BookingError::Request(format!("failed to build client: {}", e)))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl TripBooker for HttpBooker {
    async fn create_trip(&self, state: &TripState) -> Result<(), BookingError> {
        let response = self
            .client
            .post(&self.url)
            .json(state)
            .send()
            .await
            .map_err(|e| BookingError::Request(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(BookingError::Rejected {
                status: status.as_u16(),
            })
        }
    }
}
