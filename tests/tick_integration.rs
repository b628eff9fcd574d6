//! End-to-end tick tests over the full assembly (same wiring as `main.rs`):
//! a wiremocked booking endpoint behind the real `BookingClient`, real YAML
//! state files in a temp directory, and a recording notifier in place of
//! SMTP.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Local;
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ferry_watch::cache::NotificationCache;
use ferry_watch::config::Config;
use ferry_watch::failure::FailureTracker;
use ferry_watch::notify::digest::{ALERT_SUBJECT, DIGEST_SUBJECT};
use ferry_watch::notify::{Notifier, RecordingNotifier};
use ferry_watch::scheduler::run_tick;
use ferry_watch::services::booking::BookingClient;
use ferry_watch::watch::TripProvider;

// ---- Helpers ----------------------------------------------------------------

/// Booking response with trips at 4pm, 5pm and 7pm.
const TRIPS_JSON: &str = r#"{
    "departTrip": [
        {
            "tripID": "KPKK1600",
            "tripDatetime": "04:00 pm",
            "ferryName": "Alpha",
            "seatStatus": "Available",
            "left": 12,
            "unix": 1775000000
        },
        {
            "tripID": "KPKK1700",
            "tripDatetime": "05:00 pm",
            "ferryName": "Bravo",
            "seatStatus": "Selling fast",
            "left": 3,
            "unix": 1775003600
        },
        {
            "tripID": "KPKK1900",
            "tripDatetime": "07:00 pm",
            "ferryName": "Alpha",
            "seatStatus": "Available",
            "left": 20,
            "unix": 1775010800
        }
    ]
}"#;

/// Config with one KP -> KK rule for today (4pm to 6pm), the booking
/// endpoint pointed at `booking_url`, and state files inside `dir`.
fn make_config(dir: &TempDir, booking_url: &str) -> Config {
    let yaml = format!(
        r#"
cron: "*/10 * * * *"
mail:
  smtp:
    host: smtp.example.com
  from: watch@example.com
  to: [you@example.com]
booking:
  url: {booking_url}
  com_code: FW
watch:
  - from: KP
    to: KK
    date: {date}
    condition:
      between:
        start: "04:00 pm"
        end: "06:00 pm"
cache_file: {cache}
error_file: {error}
"#,
        date = Local::now().date_naive(),
        cache = dir.path().join("notified.yml").display(),
        error = dir.path().join("error.yml").display(),
    );
    serde_yaml::from_str(&yaml).expect("test config must parse")
}

fn assemble(config: &Config) -> (Arc<dyn TripProvider>, Arc<RecordingNotifier>) {
    let provider: Arc<dyn TripProvider> = Arc::new(BookingClient::new(&config.booking));
    let recording = Arc::new(RecordingNotifier::new());
    (provider, recording)
}

async fn mount_trips(server: &MockServer, body: &str) {
    Mock::given(method("POST"))
        .and(path("/trips"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body.to_string(), "application/json"))
        .mount(server)
        .await;
}

// ---- Happy path -------------------------------------------------------------

#[tokio::test]
async fn tick_emails_in_window_trips_and_persists_the_cache() {
    let server = MockServer::start().await;
    mount_trips(&server, TRIPS_JSON).await;

    let dir = TempDir::new().unwrap();
    let config = make_config(&dir, &format!("{}/trips", server.uri()));
    let (provider, recording) = assemble(&config);
    let notifier: Arc<dyn Notifier> = recording.clone();

    run_tick(&config, &provider, &notifier).await;

    let sent = recording.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].subject, DIGEST_SUBJECT);
    assert!(sent[0].body.contains("KP -> KK"));
    assert!(sent[0].body.contains("04:00 pm Alpha (Available)"));
    assert!(sent[0].body.contains("05:00 pm Bravo (Selling fast)"));
    assert!(!sent[0].body.contains("07:00 pm"));

    let cache = NotificationCache::load(&PathBuf::from(&config.cache_file)).unwrap();
    assert_eq!(cache.days().len(), 1);
    assert_eq!(cache.days()[0].trips.len(), 2);
    assert!(cache.days()[0].contains("KPKK1600", "Alpha"));
    assert!(cache.days()[0].contains("KPKK1700", "Bravo"));
}

#[tokio::test]
async fn second_tick_against_the_same_schedule_is_silent() {
    let server = MockServer::start().await;
    mount_trips(&server, TRIPS_JSON).await;

    let dir = TempDir::new().unwrap();
    let config = make_config(&dir, &format!("{}/trips", server.uri()));
    let (provider, recording) = assemble(&config);
    let notifier: Arc<dyn Notifier> = recording.clone();

    run_tick(&config, &provider, &notifier).await;
    run_tick(&config, &provider, &notifier).await;

    // Both trips were already cached by the first tick.
    assert_eq!(recording.sent().len(), 1);
}

#[tokio::test]
async fn tick_posts_the_expected_form_fields() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/trips"))
        .and(body_string_contains("comCode=FW"))
        .and(body_string_contains("originCode=KP"))
        .and(body_string_contains("destinationCode=KK"))
        .and(body_string_contains("totalPax=1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(r#"{"departTrip": []}"#, "application/json"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = make_config(&dir, &format!("{}/trips", server.uri()));
    let (provider, recording) = assemble(&config);
    let notifier: Arc<dyn Notifier> = recording.clone();

    run_tick(&config, &provider, &notifier).await;

    assert!(recording.sent().is_empty());
}

// ---- Failure streak ---------------------------------------------------------

#[tokio::test]
async fn upstream_outage_alerts_once_then_throttles_then_recovers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/trips"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = make_config(&dir, &format!("{}/trips", server.uri()));
    let (provider, recording) = assemble(&config);
    let notifier: Arc<dyn Notifier> = recording.clone();
    let tracker = FailureTracker::new(&config.error_file);

    // Tick N: upstream 502 -> cycle 1, exactly one alert.
    run_tick(&config, &provider, &notifier).await;
    assert_eq!(tracker.load().unwrap().unwrap().cycle, 1);
    let sent = recording.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].subject, ALERT_SUBJECT);
    assert!(sent[0].body.contains("502"));

    // Ticks N+1 and N+2: throttled, the endpoint is never hit again.
    run_tick(&config, &provider, &notifier).await;
    assert_eq!(tracker.load().unwrap().unwrap().cycle, 2);
    run_tick(&config, &provider, &notifier).await;
    assert_eq!(tracker.load().unwrap().unwrap().cycle, 3);
    assert_eq!(recording.sent().len(), 1);
    assert_eq!(server.received_requests().await.unwrap().len(), 1);

    // Tick N+3: cycle 3 re-attempts against a healed upstream and clears
    // the error state.
    server.reset().await;
    mount_trips(&server, TRIPS_JSON).await;

    run_tick(&config, &provider, &notifier).await;

    assert!(tracker.load().unwrap().is_none());
    let sent = recording.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[1].subject, DIGEST_SUBJECT);
}
