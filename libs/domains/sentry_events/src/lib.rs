//! Sentry Events Domain
//!
//! Fetches error events from the Sentry REST API, caches each one as a JSON
//! file, and searches the cache by custom property.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐   ┌─────────────┐
//! │ EventLister │──▶│EventEnricher│  ← cursor pagination, cache-first enrichment
//! └──────┬──────┘   └──────┬──────┘
//!        │                 │
//! ┌──────▼──────┐   ┌──────▼──────┐
//! │ EventSource │   │ EventStore  │  ← HTTP client trait / one file per event
//! └─────────────┘   └──────┬──────┘
//!                          │
//!                   ┌──────▼──────┐
//!                   │   Search    │  ← dot-path lookup, filter, render
//!                   └─────────────┘
//! ```

pub mod client;
pub mod enricher;
pub mod error;
pub mod models;
pub mod output;
pub mod pagination;
pub mod search;
pub mod store;

// Re-export commonly used types
pub use client::{EventSource, SentryClient, SentryConnection};
pub use enricher::{EnrichmentOutcome, EnrichmentReport, EventEnricher};
pub use error::{SentryError, SentryResult};
pub use models::{
    EnrichedEvent, EventDetail, EventPage, EventSummary, JsonObject, ListQuery, SearchMatch,
};
pub use output::{render, write_results, write_search_header, OutputFormat};
pub use pagination::{parse_next_cursor, EventLister, Pagination};
pub use search::{resolve_path, search_custom_props, SearchQuery};
pub use store::{is_storable_id, EventStore, DEFAULT_EVENTS_DIR};
