//! Canned trip provider backing scheduler and integration tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::watch::provider::{ProviderError, TripProvider};
use crate::watch::types::{Trip, WatchRule};

/// Returns canned trips (or a canned upstream error) and counts fetches, so
/// tests can assert whether a tick reached the provider at all.
#[derive(Default)]
pub struct MockBookingClient {
    trips: Vec<Trip>,
    error: Option<String>,
    calls: AtomicUsize,
}

impl MockBookingClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_trips(mut self, trips: Vec<Trip>) -> Self {
        self.trips = trips;
        self
    }

    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error = Some(message.into());
        self
    }

    /// Number of fetches made against this mock.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TripProvider for MockBookingClient {
    async fn fetch_trips(&self, _rule: &WatchRule) -> Result<Vec<Trip>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.error {
            Some(message) => Err(ProviderError::Upstream {
                message: message.clone(),
            }),
            None => Ok(self.trips.clone()),
        }
    }

    fn provider_name(&self) -> &str {
        "mock"
    }
}
