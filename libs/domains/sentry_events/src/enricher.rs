//! Event enrichment
//!
//! Turns listing summaries into full events, cache-first: an event whose file
//! already exists is loaded from disk and never requested again.

use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{info, warn};

use crate::client::EventSource;
use crate::models::{event_id, merge_event, project_slug, EnrichedEvent};
use crate::store::{is_storable_id, EventStore};

/// Courtesy delay after each event that went to the network
pub const EVENT_DELAY: Duration = Duration::from_millis(200);

/// Per-run counters of the enrichment phase
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EnrichmentReport {
    pub total: usize,
    /// Detail fetched and merged
    pub fetched: usize,
    /// Loaded from an existing cache file
    pub cached: usize,
    /// Detail fetch failed, summary persisted as is
    pub summary_only: usize,
    /// No usable event id on the summary
    pub skipped: usize,
    pub write_failures: usize,
}

/// Enriched events in listing order, plus the run report
#[derive(Debug, Clone, Default)]
pub struct EnrichmentOutcome {
    pub events: Vec<EnrichedEvent>,
    pub report: EnrichmentReport,
}

pub struct EventEnricher<'a, S: EventSource + ?Sized> {
    source: &'a S,
    store: &'a EventStore,
    default_project_slug: String,
    event_delay: Duration,
}

impl<'a, S: EventSource + ?Sized> EventEnricher<'a, S> {
    pub fn new(
        source: &'a S,
        store: &'a EventStore,
        default_project_slug: impl Into<String>,
    ) -> Self {
        Self {
            source,
            store,
            default_project_slug: default_project_slug.into(),
            event_delay: EVENT_DELAY,
        }
    }

    pub fn with_event_delay(mut self, event_delay: Duration) -> Self {
        self.event_delay = event_delay;
        self
    }

    /// Enrich every summary. Per-event failures are logged and never abort the run.
    pub async fn enrich(&self, summaries: Vec<Value>) -> EnrichmentOutcome {
        let total = summaries.len();
        let mut outcome = EnrichmentOutcome {
            events: Vec::with_capacity(total),
            report: EnrichmentReport {
                total,
                ..Default::default()
            },
        };

        info!(total, "Processing events (this may take a while)");

        for (idx, summary) in summaries.into_iter().enumerate() {
            let position = idx + 1;

            let Value::Object(summary) = summary else {
                warn!(position, total, "Skipping event: summary is not an object");
                outcome.report.skipped += 1;
                continue;
            };
            let Some(id) = event_id(&summary).map(str::to_owned) else {
                warn!(position, total, "Skipping event: no ID found");
                outcome.report.skipped += 1;
                continue;
            };
            if !is_storable_id(&id) {
                warn!(
                    position,
                    total,
                    event_id = %id,
                    "Skipping event: ID is not a plain file name"
                );
                outcome.report.skipped += 1;
                continue;
            }

            if self.store.contains(&id) {
                match self.store.load(&id) {
                    Ok(cached) => {
                        info!(position, total, event_id = %id, "Loading cached event");
                        outcome.events.push(cached);
                        outcome.report.cached += 1;
                        continue;
                    }
                    Err(e) => {
                        warn!(
                            event_id = %id,
                            error = %e,
                            "Failed to load cached event, will re-fetch"
                        );
                    }
                }
            }

            let slug = project_slug(&summary)
                .unwrap_or(self.default_project_slug.as_str())
                .to_string();

            info!(position, total, event_id = %id, project = %slug, "Fetching event");
            let enriched = match self.source.fetch_event(&slug, &id).await {
                Ok(detail) => {
                    outcome.report.fetched += 1;
                    merge_event(&summary, detail)
                }
                Err(e) => {
                    warn!(event_id = %id, error = %e, "Failed to fetch event, keeping summary");
                    outcome.report.summary_only += 1;
                    summary
                }
            };

            match self.store.save(&id, &enriched) {
                Ok(path) => info!(event_id = %id, path = %path.display(), "Saved event"),
                Err(e) => {
                    warn!(event_id = %id, error = %e, "Failed to save event");
                    outcome.report.write_failures += 1;
                }
            }
            outcome.events.push(enriched);

            tokio::time::sleep(self.event_delay).await;
        }

        info!(
            fetched = outcome.report.fetched,
            cached = outcome.report.cached,
            summary_only = outcome.report.summary_only,
            skipped = outcome.report.skipped,
            "Fetched {} new events, loaded {} from cache",
            outcome.report.fetched,
            outcome.report.cached
        );

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockEventSource;
    use crate::error::SentryError;
    use serde_json::json;
    use std::collections::BTreeMap;
    use std::fs;
    use std::path::Path;

    fn detail_for(id: &str) -> crate::models::EventDetail {
        json!({
            "id": id,
            "level": "error",
            "contexts": {"Custom props": {"userInfo": {"userId": format!("user-{id}")}}}
        })
        .as_object()
        .cloned()
        .unwrap()
    }

    fn snapshot(dir: &Path) -> BTreeMap<String, String> {
        fs::read_dir(dir)
            .unwrap()
            .map(|entry| {
                let path = entry.unwrap().path();
                let name = path.file_name().unwrap().to_string_lossy().into_owned();
                (name, fs::read_to_string(&path).unwrap())
            })
            .collect()
    }

    #[tokio::test]
    async fn test_enrich_merges_detail_over_summary() {
        let tmp = tempfile::tempdir().unwrap();
        let store = EventStore::new(tmp.path());

        let mut source = MockEventSource::new();
        source
            .expect_fetch_event()
            .withf(|slug, id| slug == "web" && id == "e1")
            .times(1)
            .returning(|_, _| {
                Ok(json!({"level": "error", "message": "boom"})
                    .as_object()
                    .cloned()
                    .unwrap())
            });

        let enricher =
            EventEnricher::new(&source, &store, "default").with_event_delay(Duration::ZERO);
        let outcome = enricher
            .enrich(vec![json!({"id": "e1", "level": "info", "project.name": "web"})])
            .await;

        assert_eq!(
            Value::Object(outcome.events[0].clone()),
            json!({"id": "e1", "level": "error", "message": "boom", "project.name": "web"})
        );
        assert_eq!(outcome.report.fetched, 1);
        assert_eq!(store.load("e1").unwrap(), outcome.events[0]);
    }

    #[tokio::test]
    async fn test_enrich_falls_back_to_default_project_slug() {
        let tmp = tempfile::tempdir().unwrap();
        let store = EventStore::new(tmp.path());

        let mut source = MockEventSource::new();
        source
            .expect_fetch_event()
            .withf(|slug, id| slug == "fallback" && id == "e1")
            .times(1)
            .returning(|_, id| Ok(detail_for(id)));

        let enricher =
            EventEnricher::new(&source, &store, "fallback").with_event_delay(Duration::ZERO);
        let outcome = enricher.enrich(vec![json!({"id": "e1"})]).await;

        assert_eq!(outcome.report.fetched, 1);
    }

    #[tokio::test]
    async fn test_enrich_skips_summaries_without_id() {
        let tmp = tempfile::tempdir().unwrap();
        let store = EventStore::new(tmp.path());

        let mut source = MockEventSource::new();
        source.expect_fetch_event().times(1).returning(|_, id| Ok(detail_for(id)));

        let enricher = EventEnricher::new(&source, &store, "web").with_event_delay(Duration::ZERO);
        let outcome = enricher
            .enrich(vec![json!({"title": "no id"}), json!("junk"), json!({"id": "e2"})])
            .await;

        assert_eq!(outcome.events.len(), 1);
        assert_eq!(outcome.report.skipped, 2);
        assert_eq!(outcome.report.total, 3);
        assert_eq!(snapshot(tmp.path()).len(), 1);
    }

    #[tokio::test]
    async fn test_enrich_failed_fetch_persists_summary() {
        let tmp = tempfile::tempdir().unwrap();
        let store = EventStore::new(tmp.path());

        let mut source = MockEventSource::new();
        source.expect_fetch_event().times(1).returning(|_, _| {
            Err(SentryError::Api {
                status: 404,
                body: "not found".to_string(),
            })
        });

        let summary = json!({"id": "gone", "project.name": "web", "title": "Gone"});
        let enricher = EventEnricher::new(&source, &store, "web").with_event_delay(Duration::ZERO);
        let outcome = enricher.enrich(vec![summary.clone()]).await;

        assert_eq!(outcome.report.summary_only, 1);
        assert_eq!(outcome.report.fetched, 0);
        assert_eq!(Value::Object(store.load("gone").unwrap()), summary);
    }

    #[tokio::test]
    async fn test_enrich_is_idempotent_across_runs() {
        let tmp = tempfile::tempdir().unwrap();
        let store = EventStore::new(tmp.path());
        let summaries = vec![
            json!({"id": "e1", "project.name": "web"}),
            json!({"id": "e2", "project.name": "api"}),
        ];

        let mut first = MockEventSource::new();
        first.expect_fetch_event().times(2).returning(|_, id| Ok(detail_for(id)));
        let outcome = EventEnricher::new(&first, &store, "web")
            .with_event_delay(Duration::ZERO)
            .enrich(summaries.clone())
            .await;
        assert_eq!(outcome.report.fetched, 2);
        let before = snapshot(tmp.path());

        let mut second = MockEventSource::new();
        second.expect_fetch_event().never();
        let outcome = EventEnricher::new(&second, &store, "web")
            .with_event_delay(Duration::ZERO)
            .enrich(summaries)
            .await;

        assert_eq!(outcome.report.cached, 2);
        assert_eq!(outcome.report.fetched, 0);
        assert_eq!(snapshot(tmp.path()), before);
        let ids: Vec<&str> = outcome.events.iter().map(|e| e["id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["e1", "e2"]);
    }

    #[tokio::test]
    async fn test_enrich_refetches_corrupt_cache_file() {
        let tmp = tempfile::tempdir().unwrap();
        let store = EventStore::new(tmp.path());
        fs::write(store.path_for("e1"), "{truncated").unwrap();

        let mut source = MockEventSource::new();
        source.expect_fetch_event().times(1).returning(|_, id| Ok(detail_for(id)));

        let outcome = EventEnricher::new(&source, &store, "web")
            .with_event_delay(Duration::ZERO)
            .enrich(vec![json!({"id": "e1"})])
            .await;

        assert_eq!(outcome.report.fetched, 1);
        assert_eq!(outcome.report.cached, 0);
        assert_eq!(store.load("e1").unwrap(), detail_for("e1"));
    }

    #[tokio::test]
    async fn test_enrich_write_failure_is_not_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        // Cache directory was never created
        let store = EventStore::new(tmp.path().join("missing"));

        let mut source = MockEventSource::new();
        source.expect_fetch_event().times(2).returning(|_, id| Ok(detail_for(id)));

        let outcome = EventEnricher::new(&source, &store, "web")
            .with_event_delay(Duration::ZERO)
            .enrich(vec![json!({"id": "e1"}), json!({"id": "e2"})])
            .await;

        assert_eq!(outcome.events.len(), 2);
        assert_eq!(outcome.report.write_failures, 2);
    }

    #[tokio::test]
    async fn test_enrich_skips_ids_that_escape_the_cache_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let store = EventStore::new(tmp.path().join("cache"));
        store.ensure_dir().unwrap();

        let mut source = MockEventSource::new();
        source
            .expect_fetch_event()
            .withf(|_, id| id == "ok")
            .times(1)
            .returning(|_, id| Ok(detail_for(id)));

        let outcome = EventEnricher::new(&source, &store, "web")
            .with_event_delay(Duration::ZERO)
            .enrich(vec![
                json!({"id": "../escaped"}),
                json!({"id": "nested/id"}),
                json!({"id": ".."}),
                json!({"id": "ok"}),
            ])
            .await;

        assert_eq!(outcome.report.skipped, 3);
        assert_eq!(outcome.report.fetched, 1);
        assert!(!tmp.path().join("escaped.json").exists());
        assert_eq!(snapshot(store.dir()).keys().collect::<Vec<_>>(), vec!["ok.json"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_enrich_waits_after_each_fetched_event() {
        let tmp = tempfile::tempdir().unwrap();
        let store = EventStore::new(tmp.path());

        let mut source = MockEventSource::new();
        source.expect_fetch_event().times(1).returning(|_, id| Ok(detail_for(id)));

        let start = tokio::time::Instant::now();
        let outcome = EventEnricher::new(&source, &store, "web")
            .enrich(vec![json!({"id": "e1"})])
            .await;

        assert_eq!(outcome.report.fetched, 1);
        assert_eq!(start.elapsed(), EVENT_DELAY);
    }

    #[tokio::test(start_paused = true)]
    async fn test_enrich_waits_after_failed_fetch() {
        let tmp = tempfile::tempdir().unwrap();
        let store = EventStore::new(tmp.path());

        let mut source = MockEventSource::new();
        source.expect_fetch_event().times(2).returning(|_, _| {
            Err(SentryError::Api {
                status: 500,
                body: String::new(),
            })
        });

        let start = tokio::time::Instant::now();
        EventEnricher::new(&source, &store, "web")
            .enrich(vec![json!({"id": "e1"}), json!({"id": "e2"})])
            .await;

        assert_eq!(start.elapsed(), EVENT_DELAY * 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_enrich_cache_hits_do_not_wait() {
        let tmp = tempfile::tempdir().unwrap();
        let store = EventStore::new(tmp.path());
        store.save("e1", &detail_for("e1")).unwrap();
        store.save("e2", &detail_for("e2")).unwrap();

        let mut source = MockEventSource::new();
        source.expect_fetch_event().never();

        let start = tokio::time::Instant::now();
        let outcome = EventEnricher::new(&source, &store, "web")
            .enrich(vec![json!({"id": "e1"}), json!({"id": "e2"}), json!({"title": "no id"})])
            .await;

        assert_eq!(outcome.report.cached, 2);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
