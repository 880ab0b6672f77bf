//! Sentry REST API client
//!
//! Two read endpoints are used:
//! - `GET /api/0/organizations/{org}/events/` lists event summaries (paginated)
//! - `GET /api/0/projects/{org}/{project}/events/{id}/` returns a full event

use async_trait::async_trait;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client, Response};
use serde_json::Value;
use tracing::debug;

use crate::error::{SentryError, SentryResult};
use crate::models::{EventDetail, EventPage, ListQuery, LIST_FIELDS, PAGE_SIZE};

/// Source of event summaries and event details
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Fetch one page of event summaries. `cursor` is empty for the first page.
    async fn list_events(&self, query: &ListQuery, cursor: &str) -> SentryResult<EventPage>;

    /// Fetch the full record of one event
    async fn fetch_event(&self, project_slug: &str, event_id: &str) -> SentryResult<EventDetail>;
}

/// Connection settings for the Sentry API
#[derive(Clone)]
pub struct SentryConnection {
    pub base_url: String,
    pub org_slug: String,
    pub auth_token: String,
}

impl std::fmt::Debug for SentryConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SentryConnection")
            .field("base_url", &self.base_url)
            .field("org_slug", &self.org_slug)
            .field("auth_token", &"<redacted>")
            .finish()
    }
}

/// HTTP implementation of [`EventSource`]
pub struct SentryClient {
    client: Client,
    base_url: String,
    org_slug: String,
}

impl SentryClient {
    pub fn new(connection: &SentryConnection) -> SentryResult<Self> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", connection.auth_token))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, auth);
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );

        let client = Client::builder().default_headers(headers).build()?;

        Ok(Self {
            client,
            base_url: connection.base_url.trim_end_matches('/').to_string(),
            org_slug: connection.org_slug.clone(),
        })
    }

    fn list_url(&self) -> String {
        format!("{}/api/0/organizations/{}/events/", self.base_url, self.org_slug)
    }

    fn event_url(&self, project_slug: &str, event_id: &str) -> String {
        format!(
            "{}/api/0/projects/{}/{}/events/{}/",
            self.base_url, self.org_slug, project_slug, event_id
        )
    }
}

/// Query string of a listing request, `field` repeated once per column
pub fn list_params(query: &ListQuery, cursor: &str) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("project", query.project_id.clone()),
        ("query", query.query.clone()),
        ("per_page", PAGE_SIZE.to_string()),
        ("statsPeriod", query.stats_period.clone()),
    ];
    params.extend(LIST_FIELDS.iter().map(|field| ("field", field.to_string())));
    if !cursor.is_empty() {
        params.push(("cursor", cursor.to_string()));
    }
    params
}

async fn ensure_success(response: Response) -> SentryResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(SentryError::Api {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl EventSource for SentryClient {
    async fn list_events(&self, query: &ListQuery, cursor: &str) -> SentryResult<EventPage> {
        let response = self
            .client
            .get(self.list_url())
            .query(&list_params(query, cursor))
            .send()
            .await?;
        let response = ensure_success(response).await?;

        let link = response
            .headers()
            .get(header::LINK)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let body: Value = response.json().await?;

        Ok(EventPage { body, link })
    }

    async fn fetch_event(&self, project_slug: &str, event_id: &str) -> SentryResult<EventDetail> {
        let url = self.event_url(project_slug, event_id);
        debug!(url = %url, "Fetching event detail");

        let response = self.client.get(url).send().await?;
        let response = ensure_success(response).await?;

        match response.json::<Value>().await? {
            Value::Object(detail) => Ok(detail),
            other => Err(SentryError::UnexpectedResponse(format!(
                "event {event_id} is not a JSON object: {other}"
            ))),
        }
    }
}
