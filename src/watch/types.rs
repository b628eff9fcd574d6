//! Core domain types for the ferry watcher.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime};

/// Clock-time format used by the booking provider, e.g. `"04:00 pm"`.
pub const CLOCK_FORMAT: &str = "%I:%M %p";

/// Route endpoints accepted by the booking provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceCode {
    KP,
    KK,
    PL,
}

impl PlaceCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaceCode::KP => "KP",
            PlaceCode::KK => "KK",
            PlaceCode::PL => "PL",
        }
    }
}

impl fmt::Display for PlaceCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlaceCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "KP" => Ok(PlaceCode::KP),
            "KK" => Ok(PlaceCode::KK),
            "PL" => Ok(PlaceCode::PL),
            other => Err(format!("unknown place code {other:?}")),
        }
    }
}

/// Inclusive departure-time window within a single day.
///
/// A window with `start > end` is empty and matches nothing; that is an
/// authoring concern and deliberately not validated further.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeWindow {
    /// `true` when `t` falls inside the window, inclusive of both endpoints.
    pub fn contains(&self, t: NaiveTime) -> bool {
        self.start <= t && t <= self.end
    }
}

/// A validated route/date/time-window subscription.
///
/// Built only from config entries that pass validation; immutable for the
/// lifetime of the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchRule {
    pub from: PlaceCode,
    pub to: PlaceCode,
    pub date: NaiveDate,
    pub window: TimeWindow,
}

impl WatchRule {
    /// Route label for logs and email bodies, e.g. `"KP -> KK"`.
    pub fn route(&self) -> String {
        format!("{} -> {}", self.from, self.to)
    }
}

/// One scheduled departure as returned by the booking provider.
///
/// Produced fresh each tick; never persisted directly. The wire clock-time
/// string is already parsed into a typed `departure` by the fetcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trip {
    pub trip_id: String,
    pub departure: NaiveTime,
    pub ferry_name: String,
    pub seat_status: String,
    pub seats_left: i64,
    pub unix: i64,
    pub date: NaiveDate,
}

/// One rule together with its newly matching trips; input to the notifier.
#[derive(Debug, Clone)]
pub struct MatchGroup {
    pub rule: WatchRule,
    pub trips: Vec<Trip>,
}

/// Strictly parse a provider clock-time string into a `NaiveTime`.
///
/// Accepts the provider's 12-hour format only (`"04:00 pm"`, case
/// insensitive). Anything else is an error, never a silently-out-of-window
/// value.
pub fn parse_clock_time(s: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(s.trim(), CLOCK_FORMAT)
        .map_err(|err| format!("invalid clock time {s:?}: {err}"))
}

/// Render a `NaiveTime` back in the provider's clock format.
pub fn format_clock_time(t: NaiveTime) -> String {
    t.format(CLOCK_FORMAT).to_string().to_ascii_lowercase()
}
