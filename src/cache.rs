//! Notified-trip cache persisted as a flat YAML file.
//!
//! The cache holds one `NotifiedDay` per calendar date that has ever had a
//! notified trip. The contract per tick is load, mutate in memory, save:
//! the file is read once at tick start, the in-memory list is the source of
//! truth for the whole run, and `save` rewrites the file in full.
//!
//! A missing file is an empty cache. A file that exists but cannot be read
//! or parsed is a `PersistenceError`; corrupt data must not silently decay
//! into "notify everything again".

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::PersistenceError;
use crate::watch::types::Trip;

/// A trip snapshot recorded after a successful notification.
///
/// `(trip_id, ferry_name)` is the dedup identity; `departure` is display
/// data and may be overwritten by later recordings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotifiedTrip {
    #[serde(rename = "tripID")]
    pub trip_id: String,
    #[serde(rename = "tripDatetime")]
    pub departure: NaiveTime,
    #[serde(rename = "ferryName")]
    pub ferry_name: String,
}

/// All trips ever notified for one calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotifiedDay {
    pub date: NaiveDate,
    pub trips: Vec<NotifiedTrip>,
}

impl NotifiedDay {
    pub fn contains(&self, trip_id: &str, ferry_name: &str) -> bool {
        self.trips
            .iter()
            .any(|t| t.trip_id == trip_id && t.ferry_name == ferry_name)
    }
}

/// The persisted notification cache.
#[derive(Debug)]
pub struct NotificationCache {
    path: PathBuf,
    days: Vec<NotifiedDay>,
}

impl NotificationCache {
    /// Load the cache from `path`. A missing file yields an empty cache; an
    /// unreadable or malformed file is a `PersistenceError`.
    pub fn load(path: &Path) -> Result<Self, PersistenceError> {
        let days = match fs::read_to_string(path) {
            Ok(raw) => {
                serde_yaml::from_str(&raw).map_err(|err| PersistenceError::Schema {
                    path: path.display().to_string(),
                    message: err.to_string(),
                })?
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(err) => {
                return Err(PersistenceError::Read {
                    path: path.display().to_string(),
                    message: err.to_string(),
                })
            }
        };

        Ok(Self {
            path: path.to_path_buf(),
            days,
        })
    }

    /// Read-only view for filtering; taken once per tick before any writes.
    pub fn days(&self) -> &[NotifiedDay] {
        &self.days
    }

    /// Record the day's newly notified trips, creating the day entry if
    /// absent. Each trip is inserted-or-updated by (trip_id, ferry_name):
    /// an existing entry has its departure snapshot overwritten so upstream
    /// corrections are reflected, otherwise the trip is appended.
    /// Recording the same trips twice is a no-op beyond that overwrite.
    pub fn record_notified(&mut self, date: NaiveDate, trips: &[Trip]) {
        let index = match self.days.iter().position(|day| day.date == date) {
            Some(index) => index,
            None => {
                self.days.push(NotifiedDay {
                    date,
                    trips: Vec::new(),
                });
                self.days.len() - 1
            }
        };
        let day = &mut self.days[index];

        for trip in trips {
            let snapshot = NotifiedTrip {
                trip_id: trip.trip_id.clone(),
                departure: trip.departure,
                ferry_name: trip.ferry_name.clone(),
            };
            match day
                .trips
                .iter_mut()
                .find(|t| t.trip_id == snapshot.trip_id && t.ferry_name == snapshot.ferry_name)
            {
                Some(existing) => *existing = snapshot,
                None => day.trips.push(snapshot),
            }
        }
    }

    /// Persist the full day list, overwriting the prior file.
    pub fn save(&self) -> Result<(), PersistenceError> {
        let raw = serde_yaml::to_string(&self.days).map_err(|err| PersistenceError::Write {
            path: self.path.display().to_string(),
            message: err.to_string(),
        })?;

        fs::write(&self.path, raw).map_err(|err| PersistenceError::Write {
            path: self.path.display().to_string(),
            message: err.to_string(),
        })
    }
}
