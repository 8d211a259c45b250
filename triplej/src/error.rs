//! Error types for the triple j client

/// Result type alias for triple j operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when talking to the plays/program APIs
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// API returned an error status
    #[error("API error: {0}")]
    Api(String),

    /// API returned a success status with an empty body
    #[error("API returned an empty body")]
    EmptyBody,

    /// Track record without the nested recording object; the item is
    /// skipped, never fabricated
    #[error("Track record has no recording data")]
    MissingRecording,

    /// History store error
    #[error("History store error: {0}")]
    Store(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a generic error from a string
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Create an API error
    pub fn api_error(msg: impl Into<String>) -> Self {
        Self::Api(msg.into())
    }

    /// Create a history store error
    pub fn store_error(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Short status string suitable for the published `last_error` field
    pub fn status_message(&self) -> String {
        match self {
            Self::Http(_) => "Connection error - retrying shortly".to_string(),
            Self::Json(_) | Self::MissingRecording => {
                "Unable to read now-playing data".to_string()
            }
            Self::EmptyBody => "Empty response from server".to_string(),
            Self::Api(status) => format!("Server error: {}", status),
            other => other.to_string(),
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Self::Store(err.to_string())
    }
}
