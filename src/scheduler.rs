//! Tick orchestration and the cron-driven watch loop.
//!
//! Each tick: failure-tracker gate -> re-validate rules for today -> load
//! the cache snapshot -> fetch and filter per rule concurrently -> send the
//! digest -> record into the cache and save it -> settle the failure
//! tracker.
//!
//! Errors inside the tick body are captured into the failure tracker and
//! never take the process down; the next scheduled tick retries. The loop
//! awaits every tick before sleeping again, so ticks cannot overlap and the
//! state files see exactly one reader/writer at a time.

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use chrono::Local;
use cron::Schedule;
use tokio::signal;
use tokio::task::JoinSet;

use crate::cache::{NotificationCache, NotifiedDay};
use crate::config::Config;
use crate::error::AppError;
use crate::failure::{ErrorState, FailureTracker};
use crate::notify::digest::{build_digest, build_error_alert};
use crate::notify::Notifier;
use crate::watch::filter;
use crate::watch::provider::{ProviderError, TripProvider};
use crate::watch::types::{MatchGroup, Trip};

/// Normalize a 5-field cron expression to the 6-field form the `cron` crate
/// expects by prepending a seconds column. Other field counts pass through
/// untouched and fail in `parse_cron` if invalid.
fn normalize_cron(expr: &str) -> String {
    let trimmed = expr.trim();
    if trimmed.split_whitespace().count() == 5 {
        format!("0 {trimmed}")
    } else {
        trimmed.to_string()
    }
}

/// Parse the config's cron expression. Invalid expressions are fatal at
/// startup.
pub fn parse_cron(expr: &str) -> Result<Schedule, String> {
    Schedule::from_str(&normalize_cron(expr))
        .map_err(|err| format!("invalid cron expression {expr:?}: {err}"))
}

/// Run the watch loop until Ctrl-C: one tick per cron occurrence.
pub async fn run_watch_loop(
    config: Arc<Config>,
    provider: Arc<dyn TripProvider>,
    notifier: Arc<dyn Notifier>,
    schedule: Schedule,
) {
    tracing::info!(cron = %config.cron, provider = provider.provider_name(), "watch loop started");

    loop {
        let next = match schedule.upcoming(Local).next() {
            Some(next) => next,
            None => {
                tracing::error!("cron schedule has no upcoming occurrence, stopping");
                break;
            }
        };
        let wait = (next - Local::now()).to_std().unwrap_or_default();

        tokio::select! {
            _ = tokio::time::sleep(wait) => {
                run_tick(&config, &provider, &notifier).await;
            }

            _ = signal::ctrl_c() => {
                tracing::info!("shutdown signal received, stopping watch loop");
                break;
            }
        }
    }

    tracing::info!("watch loop stopped");
}

/// What a successful tick body reports back for logging.
struct TickOutcome {
    groups: usize,
    trips: usize,
}

/// Execute one scheduled tick. All failures are captured into the failure
/// tracker; this never returns an error. Extracted from the loop for
/// testability and for `--once`.
pub async fn run_tick(
    config: &Config,
    provider: &Arc<dyn TripProvider>,
    notifier: &Arc<dyn Notifier>,
) {
    let tracker = FailureTracker::new(&config.error_file);

    // Gate: load persisted failure state. A corrupt state file counts as a
    // failure of this tick and gets rewritten fresh below.
    let state = match tracker.load() {
        Ok(state) => state,
        Err(err) => {
            settle_failure(&tracker, None, notifier, &AppError::from(err)).await;
            return;
        }
    };

    if let Some(failing) = &state {
        if failing.should_skip() {
            match tracker.record_skip(failing) {
                Ok(next) => {
                    tracing::info!(cycle = next.cycle, "failing streak, tick skipped")
                }
                Err(err) => tracing::error!("could not persist skipped cycle: {err}"),
            }
            return;
        }
        tracing::info!(cycle = failing.cycle, "failing streak, attempting recovery");
    }

    match tick_body(config, provider, notifier).await {
        Ok(outcome) => {
            if state.is_some() {
                match tracker.record_success() {
                    Ok(()) => tracing::info!("recovered, error state cleared"),
                    Err(err) => tracing::error!("could not clear error state: {err}"),
                }
            }
            tracing::info!(groups = outcome.groups, trips = outcome.trips, "tick complete");
        }
        Err(err) => settle_failure(&tracker, state.as_ref(), notifier, &err).await,
    }
}

/// Record a failed tick and, iff it starts a streak, send the one alert.
async fn settle_failure(
    tracker: &FailureTracker,
    prev: Option<&ErrorState>,
    notifier: &Arc<dyn Notifier>,
    err: &AppError,
) {
    tracing::error!("tick failed: {err}");

    match tracker.record_failure(prev, &err.to_string()) {
        Ok(state) if state.cycle == 1 => {
            let alert = build_error_alert(&state.exception);
            if let Err(send_err) = notifier.send(&alert).await {
                tracing::error!("could not send error alert: {send_err}");
            }
        }
        Ok(state) => tracing::warn!(cycle = state.cycle, "failure streak continues"),
        Err(persist_err) => tracing::error!("could not persist error state: {persist_err}"),
    }
}

async fn tick_body(
    config: &Config,
    provider: &Arc<dyn TripProvider>,
    notifier: &Arc<dyn Notifier>,
) -> Result<TickOutcome, AppError> {
    let today = Local::now().date_naive();
    let rules = config.active_rules(today);
    if rules.is_empty() {
        tracing::info!("no active watch rules");
        return Ok(TickOutcome { groups: 0, trips: 0 });
    }

    let mut cache = NotificationCache::load(Path::new(&config.cache_file))?;
    let snapshot: Arc<[NotifiedDay]> = cache.days().to_vec().into();

    // Fetch and filter per rule concurrently. Every task settles before the
    // first error (if any) fails the whole tick; rules all filter against
    // the same snapshot, never each other's pending results.
    let mut tasks = JoinSet::new();
    for (index, rule) in rules.iter().cloned().enumerate() {
        let provider = Arc::clone(provider);
        let snapshot = Arc::clone(&snapshot);
        tasks.spawn(async move {
            let trips = provider.fetch_trips(&rule).await?;
            Ok::<_, ProviderError>((index, filter::select_trips(&rule, trips, &snapshot)))
        });
    }

    let mut selected: Vec<Option<Vec<Trip>>> = vec![None; rules.len()];
    let mut first_error: Option<AppError> = None;
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Ok((index, trips))) => selected[index] = Some(trips),
            Ok(Err(err)) => {
                if first_error.is_none() {
                    first_error = Some(AppError::Upstream(err));
                }
            }
            Err(join_err) => {
                if first_error.is_none() {
                    first_error = Some(AppError::Upstream(ProviderError::Network {
                        message: format!("fetch task failed: {join_err}"),
                    }));
                }
            }
        }
    }
    if let Some(err) = first_error {
        return Err(err);
    }

    // Aggregate non-empty groups in rule order.
    let mut groups: Vec<MatchGroup> = Vec::new();
    for (rule, trips) in rules.into_iter().zip(selected) {
        let trips = trips.unwrap_or_default();
        if !trips.is_empty() {
            groups.push(MatchGroup { rule, trips });
        }
    }

    let Some(digest) = build_digest(&groups) else {
        tracing::info!("no new matching trips");
        return Ok(TickOutcome { groups: 0, trips: 0 });
    };

    notifier.send(&digest).await.map_err(AppError::Notify)?;

    let trips = groups.iter().map(|group| group.trips.len()).sum();
    for group in &groups {
        cache.record_notified(group.rule.date, &group.trips);
    }
    cache.save()?;

    Ok(TickOutcome {
        groups: groups.len(),
        trips,
    })
}
