//! Trip filtering against a watch rule and a notification-cache snapshot.
//!
//! Pure predicates over the rule's time window and the cache snapshot taken
//! at tick start. Rules within one tick all filter against the same
//! snapshot; the cache is only written after every rule has been evaluated,
//! so rules never see each other's soon-to-be-recorded results.

use crate::cache::NotifiedDay;
use crate::watch::types::{Trip, WatchRule};

/// `true` when the snapshot already holds this trip for the rule's date.
///
/// Identity is the (trip_id, ferry_name) pair: the same trip id can recur
/// across different ferries, so the id alone is not enough.
pub fn already_notified(snapshot: &[NotifiedDay], rule: &WatchRule, trip: &Trip) -> bool {
    snapshot
        .iter()
        .find(|day| day.date == rule.date)
        .map(|day| day.contains(&trip.trip_id, &trip.ferry_name))
        .unwrap_or(false)
}

/// Select the trips that belong in this tick's notification batch for one
/// rule: inside the rule's window (inclusive) and not already notified.
pub fn select_trips(rule: &WatchRule, trips: Vec<Trip>, snapshot: &[NotifiedDay]) -> Vec<Trip> {
    trips
        .into_iter()
        .filter(|trip| rule.window.contains(trip.departure))
        .filter(|trip| !already_notified(snapshot, rule, trip))
        .collect()
}
