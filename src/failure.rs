//! Consecutive-failure tracking with a 1-in-3 recovery throttle.
//!
//! State lives in a small YAML file next to the cache. An absent file means
//! healthy; `{cycle, exception}` means the last `cycle` ticks failed in a
//! row. Once failing, recovery is only attempted on cycles 3, 6, 9, ...;
//! every other tick is skipped outright, which bounds both upstream load
//! and alert volume to one alert per failure streak.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::PersistenceError;

/// Persisted failure state. Absent when healthy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorState {
    /// Count of consecutive failing ticks.
    pub cycle: u32,
    /// Detail text of the most recent failure.
    pub exception: String,
}

impl ErrorState {
    /// `true` when this tick should be skipped rather than attempted.
    pub fn should_skip(&self) -> bool {
        self.cycle % 3 != 0
    }
}

/// Reads and writes the persisted `ErrorState`.
pub struct FailureTracker {
    path: PathBuf,
}

impl FailureTracker {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted state. Absent file means healthy (`None`); an
    /// unreadable or malformed file is a `PersistenceError` and is routed
    /// into the failure path by the orchestrator, which then rewrites the
    /// file with a fresh state.
    pub fn load(&self) -> Result<Option<ErrorState>, PersistenceError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => serde_yaml::from_str(&raw)
                .map(Some)
                .map_err(|err| PersistenceError::Schema {
                    path: self.path.display().to_string(),
                    message: err.to_string(),
                }),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(PersistenceError::Read {
                path: self.path.display().to_string(),
                message: err.to_string(),
            }),
        }
    }

    /// Record one skipped tick: bump the cycle counter and persist.
    pub fn record_skip(&self, state: &ErrorState) -> Result<ErrorState, PersistenceError> {
        let next = ErrorState {
            cycle: state.cycle + 1,
            exception: state.exception.clone(),
        };
        self.persist(&next)?;
        Ok(next)
    }

    /// Record a failed tick. Returns the new state; a cycle of 1 marks the
    /// start of a streak and the caller sends the single alert for it.
    pub fn record_failure(
        &self,
        prev: Option<&ErrorState>,
        detail: &str,
    ) -> Result<ErrorState, PersistenceError> {
        let next = ErrorState {
            cycle: prev.map(|state| state.cycle + 1).unwrap_or(1),
            exception: detail.to_string(),
        };
        self.persist(&next)?;
        Ok(next)
    }

    /// A successful tick clears any persisted failure state.
    pub fn record_success(&self) -> Result<(), PersistenceError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(PersistenceError::Write {
                path: self.path.display().to_string(),
                message: err.to_string(),
            }),
        }
    }

    fn persist(&self, state: &ErrorState) -> Result<(), PersistenceError> {
        let raw = serde_yaml::to_string(state).map_err(|err| PersistenceError::Write {
            path: self.path.display().to_string(),
            message: err.to_string(),
        })?;

        fs::write(&self.path, raw).map_err(|err| PersistenceError::Write {
            path: self.path.display().to_string(),
            message: err.to_string(),
        })
    }
}
