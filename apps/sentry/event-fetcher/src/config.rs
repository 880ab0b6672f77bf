//! Configuration for the event fetcher

use core_config::{
    env_optional, env_or_default, env_parse_or_default, env_required, ConfigError, FromEnv,
};
use domain_sentry_events::{ListQuery, SentryConnection, DEFAULT_EVENTS_DIR};
use std::path::PathBuf;

fn default_stats_period() -> String {
    "10d".to_string()
}

const DEFAULT_MAX_EVENTS: usize = 500;

#[derive(Debug, Clone)]
pub struct Config {
    pub sentry: SentryConnection,
    /// Numeric project id used by the listing endpoint
    pub project_id: String,
    /// Project slug used by the detail endpoint when a summary lacks one
    pub project_slug: String,
    /// Discover query, e.g. `event.type:error user.email:*`
    pub query: String,
    pub stats_period: String,
    /// Safety cap on listed events
    pub max_events: usize,
    pub events_dir: PathBuf,
}

impl Config {
    pub fn list_query(&self) -> ListQuery {
        ListQuery {
            project_id: self.project_id.clone(),
            query: self.query.clone(),
            stats_period: self.stats_period.clone(),
        }
    }
}

impl FromEnv for Config {
    /// Required: SENTRY_BASE_URL, ORG, SENTRY_TOKEN, PROJECT_ID, PROJECT_SLUG, DISCOVER_QUERY.
    /// Optional: STATS_PERIOD (10d), MAX_EVENTS (500), EVENTS_DIR (sentry_events).
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Config {
            sentry: SentryConnection {
                base_url: env_required("SENTRY_BASE_URL")?,
                org_slug: env_required("ORG")?,
                auth_token: env_required("SENTRY_TOKEN")?,
            },
            project_id: env_required("PROJECT_ID")?,
            project_slug: env_required("PROJECT_SLUG")?,
            query: env_required("DISCOVER_QUERY")?,
            stats_period: env_optional("STATS_PERIOD").unwrap_or_else(default_stats_period),
            max_events: env_parse_or_default("MAX_EVENTS", DEFAULT_MAX_EVENTS)?,
            events_dir: PathBuf::from(env_or_default("EVENTS_DIR", DEFAULT_EVENTS_DIR)),
        })
    }
}
