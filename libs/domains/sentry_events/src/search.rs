//! Search cached events by a dot-notation path into the custom props context

use serde_json::Value;
use std::io::Write;
use std::path::Path;
use tracing::{debug, error, warn};

use crate::error::{SentryError, SentryResult};
use crate::models::{display_value, JsonObject, SearchMatch, CUSTOM_PROPS_CONTEXT};
use crate::output::write_search_header;
use crate::store::{read_event_file, EventStore};

/// What to look for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    /// Dot-notation path, e.g. `userInfo.userId`
    pub prop_path: String,
    /// Substring the value's string form must contain
    pub value_filter: Option<String>,
    pub case_sensitive: bool,
}

impl SearchQuery {
    pub fn new(prop_path: impl Into<String>) -> Self {
        Self {
            prop_path: prop_path.into(),
            value_filter: None,
            case_sensitive: true,
        }
    }

    pub fn with_filter(mut self, value_filter: impl Into<String>, case_sensitive: bool) -> Self {
        self.value_filter = Some(value_filter.into());
        self.case_sensitive = case_sensitive;
        self
    }

    /// Whether `value` passes the filter; no (or an empty) filter accepts everything
    pub fn accepts(&self, value: &Value) -> bool {
        let Some(filter) = self.value_filter.as_deref().filter(|f| !f.is_empty()) else {
            return true;
        };

        let text = display_value(value);
        if self.case_sensitive {
            text.contains(filter)
        } else {
            text.to_lowercase().contains(&filter.to_lowercase())
        }
    }
}

/// Follow `path` segment by segment through nested objects.
///
/// Returns `None` when a key is missing or an intermediate node is not an
/// object. Never fails.
pub fn resolve_path<'v>(root: &'v JsonObject, path: &str) -> Option<&'v Value> {
    let mut segments = path.split('.');
    let first = segments.next()?;
    let mut current = root.get(first)?;

    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// The custom props context of an event, if present and non-empty
pub fn custom_props(event: &JsonObject) -> Option<&JsonObject> {
    event
        .get("contexts")?
        .as_object()?
        .get(CUSTOM_PROPS_CONTEXT)?
        .as_object()
        .filter(|props| !props.is_empty())
}

/// Match one parsed event file against the query
pub fn match_event(path: &Path, event: &JsonObject, query: &SearchQuery) -> Option<SearchMatch> {
    let props = custom_props(event)?;
    let value = resolve_path(props, &query.prop_path).filter(|value| !value.is_null())?;
    if !query.accepts(value) {
        return None;
    }

    let event_id = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .filter(|stem| !stem.is_empty())
        .or_else(|| {
            event
                .get("id")
                .and_then(Value::as_str)
                .map(str::to_owned)
        })
        .unwrap_or_else(|| "unknown".to_string());

    Some(SearchMatch {
        event_id,
        file_path: path.to_path_buf(),
        value: value.clone(),
        prop_path: query.prop_path.clone(),
    })
}

/// Search every cached event file.
///
/// The header lines go to `progress`; results are left to the caller. A
/// missing events directory is reported and yields no matches. Unreadable or
/// malformed files are reported and skipped.
pub fn search_custom_props<W: Write>(
    store: &EventStore,
    query: &SearchQuery,
    progress: &mut W,
) -> SentryResult<Vec<SearchMatch>> {
    let files = match store.event_files() {
        Ok(files) => files,
        Err(SentryError::EventsDirNotFound(dir)) => {
            error!(dir = %dir.display(), "Events directory not found");
            return Ok(Vec::new());
        }
        Err(e) => return Err(e),
    };
    if files.is_empty() {
        warn!(dir = %store.dir().display(), "No JSON files found");
        return Ok(Vec::new());
    }

    write_search_header(progress, files.len(), query).map_err(|e| SentryError::io(store.dir(), e))?;
    debug!(files = files.len(), prop_path = %query.prop_path, "Searching event files");

    let mut matches = Vec::new();
    for path in files {
        match read_event_file(&path) {
            Ok(event) => matches.extend(match_event(&path, &event, query)),
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to read event file"),
        }
    }

    Ok(matches)
}
