//! YAML configuration: cron, mail and booking settings plus watch-rule
//! validation.
//!
//! The file is read and shape-checked once at startup; a missing or
//! malformed file is fatal. Watch entries are validated separately per tick
//! via `active_rules` so that rules whose date has passed age out without a
//! restart. Invalid entries are dropped with a warning, never reported as
//! errors.

use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::watch::types::{parse_clock_time, PlaceCode, TimeWindow, WatchRule};

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// 5-field cron expression driving the tick cadence.
    pub cron: String,
    pub mail: MailConfig,
    pub booking: BookingConfig,
    #[serde(default)]
    watch: Vec<WatchEntry>,
    /// Notified-trip cache file.
    #[serde(default = "default_cache_file")]
    pub cache_file: String,
    /// Error-state file.
    #[serde(default = "default_error_file")]
    pub error_file: String,
}

fn default_cache_file() -> String {
    "notified.yml".to_string()
}

fn default_error_file() -> String {
    "error.yml".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    pub smtp: SmtpConfig,
    /// Sender address, e.g. `"Ferry Watch <watch@example.com>"`.
    pub from: String,
    /// Recipient addresses.
    pub to: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    pub port: Option<u16>,
    pub tls: Option<bool>,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BookingConfig {
    /// Trip-search endpoint URL.
    pub url: String,
    /// Operator code sent as the `comCode` form field.
    pub com_code: String,
    /// Passenger count sent as the `totalPax` form field.
    #[serde(default = "default_total_pax")]
    pub total_pax: u32,
}

fn default_total_pax() -> u32 {
    1
}

/// A raw watch entry as authored in the config file.
#[derive(Debug, Clone, Deserialize)]
struct WatchEntry {
    #[serde(default = "default_enabled")]
    enabled: bool,
    from: String,
    to: String,
    date: String,
    condition: Condition,
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
struct Condition {
    between: Between,
}

#[derive(Debug, Clone, Deserialize)]
struct Between {
    start: String,
    end: String,
}

impl Config {
    /// Load the config file. A missing file or malformed YAML is fatal at
    /// startup; the caller maps this into `AppError::Config` and exits.
    pub fn load(path: &Path) -> Result<Self, String> {
        let raw = fs::read_to_string(path)
            .map_err(|err| format!("cannot read {}: {}", path.display(), err))?;

        serde_yaml::from_str(&raw)
            .map_err(|err| format!("malformed config {}: {}", path.display(), err))
    }

    /// Watch rules that pass validation against `today`.
    ///
    /// Disabled entries, unparseable or past dates, unknown place codes and
    /// unparseable window times are dropped with a warning.
    pub fn active_rules(&self, today: NaiveDate) -> Vec<WatchRule> {
        self.watch
            .iter()
            .filter_map(|entry| match validate_entry(entry, today) {
                Ok(rule) => Some(rule),
                Err(reason) => {
                    tracing::warn!(
                        from = %entry.from,
                        to = %entry.to,
                        date = %entry.date,
                        %reason,
                        "dropping watch entry"
                    );
                    None
                }
            })
            .collect()
    }
}

fn validate_entry(entry: &WatchEntry, today: NaiveDate) -> Result<WatchRule, String> {
    if !entry.enabled {
        return Err("disabled".to_string());
    }

    let from: PlaceCode = entry.from.parse()?;
    let to: PlaceCode = entry.to.parse()?;

    let date = NaiveDate::parse_from_str(entry.date.trim(), "%Y-%m-%d")
        .map_err(|err| format!("invalid date {:?}: {}", entry.date, err))?;
    if date < today {
        return Err(format!("date {date} is in the past"));
    }

    let start = parse_clock_time(&entry.condition.between.start)?;
    let end = parse_clock_time(&entry.condition.between.end)?;

    Ok(WatchRule {
        from,
        to,
        date,
        window: TimeWindow { start, end },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 6).unwrap()
    }

    fn config_with_watch(watch_yaml: &str) -> Config {
        let yaml = format!(
            r#"
cron: "*/10 * * * *"
mail:
  smtp:
    host: smtp.example.com
  from: watch@example.com
  to: [you@example.com]
booking:
  url: https://booking.example.com/trips
  com_code: FW
watch:
{watch_yaml}
"#
        );
        serde_yaml::from_str(&yaml).unwrap()
    }

    // ---- shape ----

    #[test]
    fn parses_full_config_with_defaults() {
        let config = config_with_watch("  []");
        assert_eq!(config.cron, "*/10 * * * *");
        assert_eq!(config.cache_file, "notified.yml");
        assert_eq!(config.error_file, "error.yml");
        assert_eq!(config.booking.total_pax, 1);
        assert_eq!(config.mail.to, vec!["you@example.com".to_string()]);
    }

    // ---- entry validation ----

    #[test]
    fn valid_entry_becomes_a_rule() {
        let config = config_with_watch(
            r#"  - enabled: true
    from: KP
    to: KK
    date: 2026-08-06
    condition:
      between:
        start: "04:00 pm"
        end: "06:00 pm""#,
        );

        let rules = config.active_rules(today());
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].from, PlaceCode::KP);
        assert_eq!(rules[0].to, PlaceCode::KK);
        assert_eq!(rules[0].date, today());
        assert_eq!(
            rules[0].window.start,
            NaiveTime::from_hms_opt(16, 0, 0).unwrap()
        );
        assert_eq!(
            rules[0].window.end,
            NaiveTime::from_hms_opt(18, 0, 0).unwrap()
        );
    }

    #[test]
    fn disabled_entry_is_dropped() {
        let config = config_with_watch(
            r#"  - enabled: false
    from: KP
    to: KK
    date: 2026-08-06
    condition:
      between:
        start: "04:00 pm"
        end: "06:00 pm""#,
        );

        assert!(config.active_rules(today()).is_empty());
    }

    #[test]
    fn enabled_defaults_to_true_when_omitted() {
        let config = config_with_watch(
            r#"  - from: KP
    to: KK
    date: 2026-08-06
    condition:
      between:
        start: "04:00 pm"
        end: "06:00 pm""#,
        );

        assert_eq!(config.active_rules(today()).len(), 1);
    }

    #[test]
    fn past_date_is_dropped_today_and_future_are_kept() {
        let config = config_with_watch(
            r#"  - from: KP
    to: KK
    date: 2026-08-05
    condition:
      between:
        start: "04:00 pm"
        end: "06:00 pm"
  - from: KP
    to: KK
    date: 2026-08-06
    condition:
      between:
        start: "04:00 pm"
        end: "06:00 pm"
  - from: KP
    to: KK
    date: 2026-08-07
    condition:
      between:
        start: "04:00 pm"
        end: "06:00 pm""#,
        );

        let rules = config.active_rules(today());
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].date, today());
    }

    #[test]
    fn unknown_place_code_is_dropped() {
        let config = config_with_watch(
            r#"  - from: XX
    to: KK
    date: 2026-08-06
    condition:
      between:
        start: "04:00 pm"
        end: "06:00 pm""#,
        );

        assert!(config.active_rules(today()).is_empty());
    }

    #[test]
    fn unparseable_date_or_time_is_dropped() {
        let config = config_with_watch(
            r#"  - from: KP
    to: KK
    date: sometime soon
    condition:
      between:
        start: "04:00 pm"
        end: "06:00 pm"
  - from: KP
    to: KK
    date: 2026-08-06
    condition:
      between:
        start: "4 o'clock"
        end: "06:00 pm""#,
        );

        assert!(config.active_rules(today()).is_empty());
    }

    #[test]
    fn a_rule_valid_yesterday_ages_out() {
        let config = config_with_watch(
            r#"  - from: KP
    to: KK
    date: 2026-08-06
    condition:
      between:
        start: "04:00 pm"
        end: "06:00 pm""#,
        );

        assert_eq!(config.active_rules(today()).len(), 1);
        let tomorrow = NaiveDate::from_ymd_opt(2026, 8, 7).unwrap();
        assert!(config.active_rules(tomorrow).is_empty());
    }
}
