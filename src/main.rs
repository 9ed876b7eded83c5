//! FieldTest operator tool
//!
//! Prints coach dashboards and athlete feeds from the local database as JSON.

use std::path::PathBuf;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

use fieldtest::assignments::{AssignmentListing, DashboardCards, ProgressAggregator};
use fieldtest::feed::ActivityFeed;
use fieldtest::storage::config::{load_config, load_config_from};
use fieldtest::storage::Database;

#[derive(Parser)]
#[command(name = "fieldtest", version, about = "Coach assignment and evaluation engine")]
struct Cli {
    /// Config file to use instead of the one in the data directory
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show a coach's assignments and progress cards
    Dashboard {
        #[arg(long)]
        coach: Uuid,
    },
    /// Show an athlete's recent activity
    Feed {
        #[arg(long)]
        athlete: Uuid,
        /// Window in days, defaults to the configured feed window
        #[arg(long)]
        days: Option<i64>,
    },
}

#[derive(Serialize)]
struct Dashboard {
    listing: AssignmentListing,
    by_group: DashboardCards,
    by_test: DashboardCards,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config_from(path),
        None => load_config(),
    }
    .context("loading configuration")?;

    let db_path = config.database_path();
    tracing::info!("Opening database at {}", db_path.display());
    let db = Database::open(&db_path).context("opening database")?;
    let conn = db.connection();
    let now = Utc::now();

    let output = match cli.command {
        Command::Dashboard { coach } => {
            let aggregator = ProgressAggregator::new(conn);
            let dashboard = Dashboard {
                listing: aggregator.listing(coach, now)?,
                by_group: aggregator.by_group(coach)?,
                by_test: aggregator.by_test(coach)?,
            };
            serde_json::to_string_pretty(&dashboard)?
        }
        Command::Feed { athlete, days } => {
            let window = days.unwrap_or(config.feed.window_days);
            let items = ActivityFeed::new(conn).build_feed(athlete, window, now)?;
            serde_json::to_string_pretty(&items)?
        }
    };

    println!("{output}");
    Ok(())
}
