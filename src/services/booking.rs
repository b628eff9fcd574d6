//! Booking provider HTTP client.
//!
//! POSTs the provider's trip-search endpoint once per (rule, tick) and
//! decodes the `departTrip` array into domain `Trip`s. Any unparseable
//! record fails the whole fetch with a format error rather than being
//! silently dropped.

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;

use crate::config::BookingConfig;
use crate::watch::provider::{ProviderError, TripProvider};
use crate::watch::types::{parse_clock_time, Trip, WatchRule};

#[derive(Clone)]
pub struct BookingClient {
    http: Client,
    url: String,
    com_code: String,
    total_pax: u32,
}

/// Trip-search response envelope.
#[derive(Debug, Deserialize)]
struct TripSearchResponse {
    #[serde(rename = "departTrip", default)]
    depart_trip: Vec<TripRecord>,
}

/// One trip as the provider sends it.
#[derive(Debug, Deserialize)]
struct TripRecord {
    #[serde(rename = "tripID")]
    trip_id: String,
    #[serde(rename = "tripDatetime")]
    trip_datetime: String,
    #[serde(rename = "ferryName")]
    ferry_name: String,
    #[serde(rename = "seatStatus")]
    seat_status: String,
    left: i64,
    unix: i64,
}

impl BookingClient {
    pub fn new(config: &BookingConfig) -> Self {
        Self {
            http: Client::new(),
            url: config.url.clone(),
            com_code: config.com_code.clone(),
            total_pax: config.total_pax,
        }
    }

    fn convert(record: TripRecord, date: NaiveDate) -> Result<Trip, ProviderError> {
        let departure = parse_clock_time(&record.trip_datetime)
            .map_err(|message| ProviderError::Format { message })?;

        Ok(Trip {
            trip_id: record.trip_id,
            departure,
            ferry_name: record.ferry_name,
            seat_status: record.seat_status,
            seats_left: record.left,
            unix: record.unix,
            date,
        })
    }
}

#[async_trait]
impl TripProvider for BookingClient {
    async fn fetch_trips(&self, rule: &WatchRule) -> Result<Vec<Trip>, ProviderError> {
        // Midnight UTC of the depart date; the provider treats it as the
        // earliest trip of interest.
        let first_trip_unix = rule
            .date
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc().timestamp())
            .unwrap_or(0);

        let form = [
            ("comCode", self.com_code.clone()),
            ("firstTripUnix", first_trip_unix.to_string()),
            ("departDate", rule.date.format("%Y-%m-%d").to_string()),
            ("originCode", rule.from.to_string()),
            ("destinationCode", rule.to.to_string()),
            ("totalPax", self.total_pax.to_string()),
        ];

        let response = self
            .http
            .post(&self.url)
            .form(&form)
            .send()
            .await
            .map_err(|err| ProviderError::Network {
                message: err.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(ProviderError::Upstream {
                message: format!("trip search returned HTTP {}", response.status()),
            });
        }

        let decoded =
            response
                .json::<TripSearchResponse>()
                .await
                .map_err(|err| ProviderError::Format {
                    message: err.to_string(),
                })?;

        decoded
            .depart_trip
            .into_iter()
            .map(|record| Self::convert(record, rule.date))
            .collect()
    }

    fn provider_name(&self) -> &str {
        "booking"
    }
}
