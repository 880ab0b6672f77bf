//! Cursor pagination over the event listing endpoint
//!
//! The loop driver ([`EventLister`]) is a small state machine over
//! [`Pagination`]; the `Link` header parser ([`parse_next_cursor`]) is a pure
//! function so both can be tested on their own.

use serde_json::Value;
use std::time::Duration;
use tracing::info;

use crate::client::EventSource;
use crate::error::{SentryError, SentryResult};
use crate::models::{EventPage, ListQuery};

/// Courtesy delay between listing requests
pub const PAGE_DELAY: Duration = Duration::from_millis(100);

/// Where a listing run stands after a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pagination {
    /// Another page should be requested; an empty cursor means the first page
    HasMore(String),
    /// The remote has no further results
    Exhausted,
    /// The accumulated total reached the configured cap
    Capped,
}

impl Pagination {
    pub fn start() -> Self {
        Pagination::HasMore(String::new())
    }

    /// Transition after a page of `batch_len` events, `total` accumulated so far
    pub fn advance(batch_len: usize, total: usize, max_events: usize, link: Option<&str>) -> Self {
        if batch_len == 0 {
            return Pagination::Exhausted;
        }
        if total >= max_events {
            return Pagination::Capped;
        }
        match link.and_then(parse_next_cursor) {
            Some(cursor) => Pagination::HasMore(cursor),
            None => Pagination::Exhausted,
        }
    }
}

/// Extract the next-page cursor from a `Link` header.
///
/// The header is a comma-separated list of descriptors such as
/// `<https://...>; rel="next"; results="true"; cursor="abc:0:1"`. Only a
/// descriptor with both `rel="next"` and `results="true"` counts. Anything
/// unparsable yields `None`.
pub fn parse_next_cursor(link: &str) -> Option<String> {
    link.split(',')
        .map(str::trim)
        .filter(|part| part.contains(r#"rel="next""#) && part.contains(r#"results="true""#))
        .find_map(|part| {
            part.split(';')
                .map(str::trim)
                .find_map(|segment| segment.strip_prefix("cursor="))
                .map(|raw| raw.trim().trim_matches('"').to_string())
                .filter(|cursor| !cursor.is_empty())
        })
}

/// Normalize a listing body: either a bare array or `{"data": [...]}`
pub fn extract_batch(body: Value) -> SentryResult<Vec<Value>> {
    match body {
        Value::Array(items) => Ok(items),
        Value::Object(mut wrapper) => match wrapper.remove("data") {
            Some(Value::Array(items)) => Ok(items),
            Some(Value::Null) => Ok(Vec::new()),
            Some(other) => Err(SentryError::UnexpectedResponse(format!(
                "\"data\" is not an array: {other}"
            ))),
            None => Err(SentryError::UnexpectedResponse(
                "listing response has no \"data\" key".to_string(),
            )),
        },
        Value::Null => Ok(Vec::new()),
        other => Err(SentryError::UnexpectedResponse(format!(
            "listing response is neither an array nor an object: {other}"
        ))),
    }
}

/// Lists every event summary matching a query, up to a cap
pub struct EventLister<'a, S: EventSource + ?Sized> {
    source: &'a S,
    query: ListQuery,
    max_events: usize,
    page_delay: Duration,
}

impl<'a, S: EventSource + ?Sized> EventLister<'a, S> {
    pub fn new(source: &'a S, query: ListQuery, max_events: usize) -> Self {
        Self {
            source,
            query,
            max_events,
            page_delay: PAGE_DELAY,
        }
    }

    pub fn with_page_delay(mut self, page_delay: Duration) -> Self {
        self.page_delay = page_delay;
        self
    }

    /// Fetch pages until the remote is exhausted or the cap is reached.
    ///
    /// Any failed page aborts the whole listing. The last batch is never
    /// trimmed, so the result may exceed the cap by up to one page.
    pub async fn list_all(&self) -> SentryResult<Vec<Value>> {
        let mut events = Vec::new();
        let mut state = Pagination::start();

        while let Pagination::HasMore(cursor) = state {
            info!(cursor = %cursor, "Requesting events page");

            let EventPage { body, link } = self.source.list_events(&self.query, &cursor).await?;
            let batch = extract_batch(body)?;
            let batch_len = batch.len();
            events.extend(batch);

            state = Pagination::advance(batch_len, events.len(), self.max_events, link.as_deref());
            match &state {
                Pagination::HasMore(_) => {
                    info!(batch = batch_len, total = events.len(), "Fetched events page");
                    tokio::time::sleep(self.page_delay).await;
                }
                Pagination::Capped => {
                    info!(
                        total = events.len(),
                        max_events = self.max_events,
                        "Reached max events, stopping pagination"
                    );
                }
                Pagination::Exhausted if batch_len == 0 => {
                    info!("No more events returned in this batch");
                }
                Pagination::Exhausted => {
                    info!(
                        batch = batch_len,
                        total = events.len(),
                        "No next cursor found, pagination finished"
                    );
                }
            }
        }

        Ok(events)
    }
}
