use serde::Serialize;
use serde_json::{Map, Value};
use std::path::PathBuf;

/// Fields requested from the listing endpoint
pub const LIST_FIELDS: &[&str] = &[
    "id",
    "timestamp",
    "message",
    "title",
    "project",
    "release",
    "environment",
    "user",
    "tags",
    "contexts",
    "sdk",
    "level",
    "type",
];

/// Page size requested from the listing endpoint
pub const PAGE_SIZE: u32 = 100;

/// Key of the context holding application-defined properties
pub const CUSTOM_PROPS_CONTEXT: &str = "Custom props";

/// A JSON object as returned by the API or stored on disk
pub type JsonObject = Map<String, Value>;

/// Event summary from the listing endpoint
pub type EventSummary = JsonObject;

/// Full event record from the detail endpoint
pub type EventDetail = JsonObject;

/// Summary overlaid with detail; the unit of persistence
pub type EnrichedEvent = JsonObject;

/// Parameters of a listing run that stay fixed across pages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub project_id: String,
    pub query: String,
    pub stats_period: String,
}

/// One page of the listing endpoint, before normalization
#[derive(Debug, Clone, PartialEq)]
pub struct EventPage {
    /// Raw response body: a bare array or a `{"data": [...]}` wrapper
    pub body: Value,
    /// Raw `Link` response header, if any
    pub link: Option<String>,
}

/// Event identifier of a summary or enriched event
pub fn event_id(event: &JsonObject) -> Option<&str> {
    event
        .get("id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
}

/// Project slug recorded on a summary
pub fn project_slug(event: &JsonObject) -> Option<&str> {
    event
        .get("project.name")
        .and_then(Value::as_str)
        .filter(|slug| !slug.is_empty())
}

/// Overlay `detail` on `summary`; detail fields win on collision
pub fn merge_event(summary: &EventSummary, detail: EventDetail) -> EnrichedEvent {
    let mut merged = summary.clone();
    merged.extend(detail);
    merged
}

/// Rebuild every nested object with lexicographically ordered keys
pub fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, sort_keys(value)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

/// String form of a JSON value: strings unquoted, everything else as compact JSON
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// A cached event whose custom property matched a search
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchMatch {
    pub event_id: String,
    pub file_path: PathBuf,
    pub value: Value,
    pub prop_path: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> JsonObject {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_merge_detail_wins_on_collision() {
        let summary = object(json!({"id": "e1", "level": "info"}));
        let detail = object(json!({"level": "error", "message": "boom"}));

        let merged = merge_event(&summary, detail);

        assert_eq!(
            Value::Object(merged),
            json!({"id": "e1", "level": "error", "message": "boom"})
        );
    }

    #[test]
    fn test_event_id_and_project_slug() {
        let summary = object(json!({"id": "abc", "project.name": "web"}));
        assert_eq!(event_id(&summary), Some("abc"));
        assert_eq!(project_slug(&summary), Some("web"));

        let bare = object(json!({"id": "", "project.name": null}));
        assert_eq!(event_id(&bare), None);
        assert_eq!(project_slug(&bare), None);
    }

    #[test]
    fn test_sort_keys_is_recursive() {
        let sorted = sort_keys(json!({"b": {"z": 1, "a": 2}, "a": [{"y": 1, "x": 2}]}));
        let text = serde_json::to_string(&sorted).unwrap();
        assert_eq!(text, r#"{"a":[{"x":2,"y":1}],"b":{"a":2,"z":1}}"#);
    }

    #[test]
    fn test_display_value() {
        assert_eq!(display_value(&json!("alice")), "alice");
        assert_eq!(display_value(&json!(42)), "42");
        assert_eq!(display_value(&json!(true)), "true");
        assert_eq!(display_value(&json!({"a": 1})), r#"{"a":1}"#);
    }
}
