//! Trip provider contract.
//!
//! Abstracts the booking endpoint so the orchestrator and tests do not
//! depend on the live HTTP client.

use async_trait::async_trait;
use thiserror::Error;

use crate::watch::types::{Trip, WatchRule};

/// Errors from trip providers.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("network error: {message}")]
    Network { message: String },

    #[error("upstream error: {message}")]
    Upstream { message: String },

    #[error("format error: {message}")]
    Format { message: String },
}

/// Source of trip schedules for a route/date.
#[async_trait]
pub trait TripProvider: Send + Sync {
    /// Fetch all trips for the rule's route and depart date.
    async fn fetch_trips(&self, rule: &WatchRule) -> Result<Vec<Trip>, ProviderError>;

    /// Human-readable name for logging.
    fn provider_name(&self) -> &str;
}
