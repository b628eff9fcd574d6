//! Email content for trip digests and error alerts.

use crate::notify::Notification;
use crate::watch::types::{format_clock_time, MatchGroup};

/// Fixed subject line for the trip digest email.
pub const DIGEST_SUBJECT: &str = "Ferry trips available";

/// Fixed subject line for the error alert email.
pub const ALERT_SUBJECT: &str = "Ferry watch error";

/// Build the digest email for this tick's matches.
///
/// Returns `None` when there is nothing to report, in which case no email
/// is sent at all. Group and trip order is preserved as given.
pub fn build_digest(groups: &[MatchGroup]) -> Option<Notification> {
    if groups.is_empty() {
        return None;
    }

    let mut body = String::new();
    for group in groups {
        body.push_str(&format!("{} {}\n", group.rule.date, group.rule.route()));
        for trip in &group.trips {
            body.push_str(&format!(
                "  {} {} ({})\n",
                format_clock_time(trip.departure),
                trip.ferry_name,
                trip.seat_status,
            ));
        }
        body.push('\n');
    }

    Some(Notification {
        subject: DIGEST_SUBJECT.to_string(),
        body,
    })
}

/// Build the one-per-streak error alert email.
pub fn build_error_alert(detail: &str) -> Notification {
    Notification {
        subject: ALERT_SUBJECT.to_string(),
        body: detail.to_string(),
    }
}
