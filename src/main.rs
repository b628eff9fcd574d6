use std::sync::Arc;

use clap::Parser;
use dotenvy::dotenv;

use ferry_watch::cli::Cli;
use ferry_watch::config::Config;
use ferry_watch::logging::init_logging;
use ferry_watch::notify::{EmailNotifier, Notifier};
use ferry_watch::scheduler;
use ferry_watch::services::booking::BookingClient;
use ferry_watch::watch::TripProvider;

#[tokio::main]
async fn main() {
    dotenv().ok();
    init_logging();

    let cli = Cli::parse();

    let config = Config::load(&cli.config).unwrap_or_else(|err| {
        tracing::error!("Config error: {err}");
        std::process::exit(1);
    });

    let schedule = scheduler::parse_cron(&config.cron).unwrap_or_else(|err| {
        tracing::error!("Config error: {err}");
        std::process::exit(1);
    });

    let notifier: Arc<dyn Notifier> = Arc::new(
        EmailNotifier::from_config(&config.mail).unwrap_or_else(|err| {
            tracing::error!("Config error: {err}");
            std::process::exit(1);
        }),
    );

    let provider: Arc<dyn TripProvider> = Arc::new(BookingClient::new(&config.booking));
    let config = Arc::new(config);

    tracing::info!(config = %cli.config.display(), "ferry-watch started");

    if cli.once {
        scheduler::run_tick(&config, &provider, &notifier).await;
        return;
    }

    scheduler::run_watch_loop(config, provider, notifier, schedule).await;
}
