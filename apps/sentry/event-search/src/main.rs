//! Event Search
//!
//! Searches cached Sentry event files for a value under `contexts["Custom props"]`
//! using a dot-notation path such as `userInfo.userId`.
//!
//! Results go to stdout; progress and warnings go to stderr.

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use core_config::tracing::{init_tracing, install_color_eyre};
use core_config::{load_dotenv, Environment, FromEnv};
use domain_sentry_events::{
    search_custom_props, write_results, EventStore, OutputFormat, SearchQuery,
};
use eyre::{Result, WrapErr};
use std::io::Write;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::debug;

mod config;

use config::SearchDefaults;

#[derive(Parser, Debug)]
#[command(name = "event-search")]
#[command(about = "Search Sentry event JSON files for Custom Prop values")]
#[command(after_help = "Examples:
  event-search userInfo.userId
  event-search userInfo.userId --value 12345
  event-search userInfo.userName --value john --case-insensitive
  event-search userInfo.userId --format json
  event-search userInfo.userId --format values")]
struct Cli {
    /// Dot-notation path to the Custom Prop (defaults to PROP_PATH)
    prop_path: Option<String>,

    /// Only keep values containing this substring (defaults to VALUE_FILTER)
    #[arg(long = "value")]
    value_filter: Option<String>,

    /// Case-insensitive value filtering (overrides CASE_SENSITIVE)
    #[arg(long)]
    case_insensitive: bool,

    /// Output format: table, json, csv or values (defaults to OUTPUT_FORMAT, then table)
    #[arg(long, value_parser = OutputFormat::from_str)]
    format: Option<OutputFormat>,

    /// Directory containing event JSON files (defaults to EVENTS_DIR, then sentry_events)
    #[arg(long)]
    events_dir: Option<PathBuf>,
}

/// Fully resolved search settings
#[derive(Debug, Clone, PartialEq, Eq)]
struct Settings {
    query: SearchQuery,
    format: OutputFormat,
    events_dir: PathBuf,
}

impl Cli {
    /// Merge flags over environment defaults. `None` when no path is known.
    fn resolve(self, defaults: SearchDefaults) -> Option<Settings> {
        let prop_path = self
            .prop_path
            .filter(|path| !path.is_empty())
            .or(defaults.prop_path)?;

        let case_sensitive = if self.case_insensitive {
            false
        } else {
            defaults.case_sensitive
        };

        Some(Settings {
            query: SearchQuery {
                prop_path,
                value_filter: self.value_filter.or(defaults.value_filter),
                case_sensitive,
            },
            format: self.format.unwrap_or(defaults.output_format),
            events_dir: self.events_dir.unwrap_or(defaults.events_dir),
        })
    }
}

fn main() -> Result<()> {
    install_color_eyre();
    load_dotenv();
    init_tracing(&Environment::from_env());

    let cli = Cli::parse();
    let defaults = SearchDefaults::from_env()?;

    let Some(settings) = cli.resolve(defaults) else {
        Cli::command()
            .error(
                ErrorKind::MissingRequiredArgument,
                "prop_path is required. \
                 Provide it as an argument or set PROP_PATH in the environment.",
            )
            .exit();
    };

    debug!(?settings, "Resolved search settings");

    let store = EventStore::new(&settings.events_dir);
    let matches = search_custom_props(&store, &settings.query, &mut std::io::stderr().lock())?;

    let mut stdout = std::io::stdout().lock();
    write_results(&mut stdout, &matches, settings.format).wrap_err("Failed to write results")?;
    stdout.flush()?;

    Ok(())
}
