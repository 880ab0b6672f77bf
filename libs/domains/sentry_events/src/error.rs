use std::path::PathBuf;
use thiserror::Error;

/// Result type for event cache operations
pub type SentryResult<T> = Result<T, SentryError>;

/// Errors that can occur while listing, enriching, caching or searching events
#[derive(Debug, Error)]
pub enum SentryError {
    /// Transport-level HTTP failure
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status
    #[error("API returned {status}: {body}")]
    Api { status: u16, body: String },

    /// The API answered with a body of an unexpected shape
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    /// The auth token cannot be sent as a header value
    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    /// Reading or writing a cache file failed
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A cache file does not hold a valid JSON object
    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The events directory is missing
    #[error("Events directory not found: {0}")]
    EventsDirNotFound(PathBuf),
}

impl SentryError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SentryError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        SentryError::Json {
            path: path.into(),
            source,
        }
    }
}
