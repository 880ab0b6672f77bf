//! On-disk event cache: one `<event-id>.json` file per event

use serde_json::Value;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{SentryError, SentryResult};
use crate::models::{sort_keys, JsonObject};

/// Default cache directory, relative to the working directory
pub const DEFAULT_EVENTS_DIR: &str = "sentry_events";

/// Directory of cached event files.
///
/// Files are written whole and never renamed or deleted; an existing file is
/// authoritative for its event.
#[derive(Debug, Clone)]
pub struct EventStore {
    dir: PathBuf,
}

impl EventStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the cache directory if it does not exist yet
    pub fn ensure_dir(&self) -> SentryResult<()> {
        fs::create_dir_all(&self.dir).map_err(|e| SentryError::io(&self.dir, e))
    }

    pub fn path_for(&self, event_id: &str) -> PathBuf {
        self.dir.join(format!("{event_id}.json"))
    }

    pub fn contains(&self, event_id: &str) -> bool {
        self.path_for(event_id).exists()
    }

    /// Read a cached event
    pub fn load(&self, event_id: &str) -> SentryResult<JsonObject> {
        read_event_file(&self.path_for(event_id))
    }

    /// Write an event with sorted keys and two-space indentation
    pub fn save(&self, event_id: &str, event: &JsonObject) -> SentryResult<PathBuf> {
        let path = self.path_for(event_id);
        let sorted = sort_keys(Value::Object(event.clone()));
        let text = serde_json::to_string_pretty(&sorted).map_err(|e| SentryError::json(&path, e))?;
        fs::write(&path, text).map_err(|e| SentryError::io(&path, e))?;
        Ok(path)
    }

    /// All `*.json` files in the directory, sorted by file name
    pub fn event_files(&self) -> SentryResult<Vec<PathBuf>> {
        if !self.dir.is_dir() {
            return Err(SentryError::EventsDirNotFound(self.dir.clone()));
        }

        let entries = fs::read_dir(&self.dir).map_err(|e| SentryError::io(&self.dir, e))?;
        let mut files = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| SentryError::io(&self.dir, e))?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

/// Whether `event_id` maps to a single file directly inside the cache directory.
///
/// Rejects ids carrying a path separator, `.` and `..`.
pub fn is_storable_id(event_id: &str) -> bool {
    !event_id.is_empty() && Path::new(event_id).file_name() == Some(OsStr::new(event_id))
}

/// Parse a file that must hold a JSON object
pub fn read_event_file(path: &Path) -> SentryResult<JsonObject> {
    let text = fs::read_to_string(path).map_err(|e| SentryError::io(path, e))?;
    match serde_json::from_str::<Value>(&text).map_err(|e| SentryError::json(path, e))? {
        Value::Object(event) => Ok(event),
        other => Err(SentryError::UnexpectedResponse(format!(
            "{} does not hold a JSON object: {}",
            path.display(),
            other
        ))),
    }
}
