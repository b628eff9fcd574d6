//! Notification formatting and delivery.
//!
//! Content (digest and alert bodies) is owned by this crate; delivery goes
//! through the `Notifier` trait so the orchestrator and tests are
//! independent of SMTP.

pub mod digest;
pub mod email;
pub mod recording;

use thiserror::Error;

pub use email::EmailNotifier;
pub use recording::RecordingNotifier;

/// Errors that can occur during notification delivery.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("SMTP delivery failed: {0}")]
    Smtp(String),

    #[error("Mail configuration error: {0}")]
    Config(String),
}

/// A rendered notification ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub subject: String,
    pub body: String,
}

/// Delivery channel for rendered notifications.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError>;
}
