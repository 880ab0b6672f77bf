//! Event Fetcher Service
//!
//! Lists events for the configured query, then enriches and caches each one.

use domain_sentry_events::{
    EnrichmentReport, EventEnricher, EventLister, EventSource, EventStore, SentryClient,
};
use eyre::{Result, WrapErr};
use std::path::PathBuf;
use tracing::{info, warn};

use crate::config::Config;

/// Result of a fetch run
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub summaries_listed: usize,
    pub events_processed: usize,
    pub report: EnrichmentReport,
    pub events_dir: PathBuf,
    pub duration_ms: u64,
}

pub struct EventFetcher<S: EventSource> {
    source: S,
    config: Config,
    store: EventStore,
}

impl EventFetcher<SentryClient> {
    pub fn from_config(config: Config) -> Result<Self> {
        let client = SentryClient::new(&config.sentry).wrap_err("Failed to build Sentry client")?;
        Ok(Self::new(client, config))
    }
}

impl<S: EventSource> EventFetcher<S> {
    pub fn new(source: S, config: Config) -> Self {
        let store = EventStore::new(config.events_dir.clone());
        Self {
            source,
            config,
            store,
        }
    }

    /// Run one fetch. Only a failed listing aborts; per-event failures are counted.
    pub async fn run(&self) -> Result<FetchResult> {
        let start = std::time::Instant::now();

        info!(
            org = %self.config.sentry.org_slug,
            project_id = %self.config.project_id,
            query = %self.config.query,
            stats_period = %self.config.stats_period,
            "Fetching events"
        );

        let lister =
            EventLister::new(&self.source, self.config.list_query(), self.config.max_events);
        let summaries = lister
            .list_all()
            .await
            .wrap_err("Error listing events")?;
        let summaries_listed = summaries.len();
        info!(total = summaries_listed, "Total event summaries fetched");

        let events_dir = std::path::absolute(self.store.dir())
            .unwrap_or_else(|_| self.store.dir().to_path_buf());

        if summaries.is_empty() {
            warn!("No events found. Double-check ORG, SENTRY_TOKEN, and DISCOVER_QUERY.");
            return Ok(FetchResult {
                summaries_listed,
                events_processed: 0,
                report: EnrichmentReport::default(),
                events_dir,
                duration_ms: start.elapsed().as_millis() as u64,
            });
        }

        self.store
            .ensure_dir()
            .wrap_err("Failed to create events directory")?;

        let enricher =
            EventEnricher::new(&self.source, &self.store, self.config.project_slug.clone());
        let outcome = enricher.enrich(summaries).await;

        info!(
            processed = outcome.events.len(),
            dir = %events_dir.display(),
            "Individual event files saved"
        );

        Ok(FetchResult {
            summaries_listed,
            events_processed: outcome.events.len(),
            report: outcome.report,
            events_dir,
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }
}
