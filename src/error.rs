//! Unified application error taxonomy.
//!
//! `Config` is fatal at startup; every other variant is caught at the
//! orchestrator boundary and recorded by the failure tracker, so a failing
//! tick never takes the process down.

use thiserror::Error;

use crate::notify::NotifyError;
use crate::watch::provider::ProviderError;

/// Top-level error for one watch tick.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Upstream error: {0}")]
    Upstream(#[from] ProviderError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("Notification error: {0}")]
    Notify(#[from] NotifyError),
}

/// Errors reading or writing the YAML state files (notified cache, error
/// state). A missing file is never an error here; callers treat absence as
/// the healthy default and only reach for these variants on real I/O or
/// schema trouble.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("failed to read {path}: {message}")]
    Read { path: String, message: String },

    #[error("failed to write {path}: {message}")]
    Write { path: String, message: String },

    #[error("malformed YAML in {path}: {message}")]
    Schema { path: String, message: String },
}
