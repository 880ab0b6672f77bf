//! Defaults for the search tool, read from the environment

use core_config::{env_flag, env_optional, env_or_default, ConfigError, FromEnv};
use domain_sentry_events::{OutputFormat, DEFAULT_EVENTS_DIR};
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchDefaults {
    pub prop_path: Option<String>,
    pub value_filter: Option<String>,
    pub case_sensitive: bool,
    pub output_format: OutputFormat,
    pub events_dir: PathBuf,
}

impl Default for SearchDefaults {
    fn default() -> Self {
        Self {
            prop_path: None,
            value_filter: None,
            case_sensitive: true,
            output_format: OutputFormat::Table,
            events_dir: PathBuf::from(DEFAULT_EVENTS_DIR),
        }
    }
}

impl FromEnv for SearchDefaults {
    /// Reads PROP_PATH, VALUE_FILTER, CASE_SENSITIVE (true), OUTPUT_FORMAT (table)
    /// and EVENTS_DIR (sentry_events).
    fn from_env() -> Result<Self, ConfigError> {
        let output_format = match env_optional("OUTPUT_FORMAT") {
            Some(raw) => OutputFormat::from_str(&raw).map_err(|e| ConfigError::ParseError {
                key: "OUTPUT_FORMAT".to_string(),
                details: format!("{e}: expected one of table, json, csv, values"),
            })?,
            None => OutputFormat::default(),
        };

        Ok(Self {
            prop_path: env_optional("PROP_PATH"),
            value_filter: env_optional("VALUE_FILTER"),
            case_sensitive: env_flag("CASE_SENSITIVE", true),
            output_format,
            events_dir: PathBuf::from(env_or_default("EVENTS_DIR", DEFAULT_EVENTS_DIR)),
        })
    }
}
