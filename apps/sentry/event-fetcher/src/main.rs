//! Event Fetcher
//!
//! Pulls every event matching a Sentry Discover query, fetches the full
//! record of each one, and caches it as `<events_dir>/<event_id>.json`.
//! Already-cached events are never requested again, so an interrupted run can
//! simply be restarted.
//!
//! Configured entirely through environment variables (or a `.env` file).

use core_config::tracing::{init_tracing, install_color_eyre};
use core_config::{load_dotenv, Environment, FromEnv};
use eyre::Result;
use tracing::info;

mod config;
mod fetcher;

use config::Config;
use fetcher::EventFetcher;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    install_color_eyre();

    let dotenv = load_dotenv();
    let environment = Environment::from_env();
    init_tracing(&environment);
    if let Some(path) = dotenv {
        info!(path = %path.display(), "Loaded environment file");
    }

    let config = Config::from_env()?;

    let fetcher = EventFetcher::from_config(config)?;
    let result = fetcher.run().await?;

    info!(
        listed = result.summaries_listed,
        processed = result.events_processed,
        fetched = result.report.fetched,
        cached = result.report.cached,
        summary_only = result.report.summary_only,
        skipped = result.report.skipped,
        write_failures = result.report.write_failures,
        duration_ms = result.duration_ms,
        "Processed {} events. Individual event files saved to: {}",
        result.events_processed,
        result.events_dir.display()
    );

    Ok(())
}

