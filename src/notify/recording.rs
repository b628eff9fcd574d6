//! Recording notifier backing scheduler and integration tests.

use std::sync::Mutex;

use crate::notify::{Notification, Notifier, NotifyError};

/// Captures every notification instead of delivering it. Can be switched to
/// fail every send, for exercising the delivery failure path.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// A notifier whose every send fails.
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    /// Everything sent so far, in delivery order.
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        if self.fail {
            return Err(NotifyError::Smtp(
                "recording notifier set to fail".to_string(),
            ));
        }
        self.sent.lock().unwrap().push(notification.clone());
        Ok(())
    }
}
