use std::path::PathBuf;

use clap::Parser;

/// Ferry watch CLI arguments
#[derive(Debug, Parser)]
#[command(
    name = "ferry-watch",
    version,
    about = "Watches ferry trip schedules and emails newly matching departures"
)]
pub struct Cli {
    /// Path to the YAML config file
    #[arg(long, default_value = "config.yml")]
    pub config: PathBuf,

    /// Run a single tick and exit instead of looping on the cron schedule
    #[arg(long)]
    pub once: bool,
}
