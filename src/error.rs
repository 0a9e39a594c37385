//! Error types for pagecast.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PagecastError {
    // Configuration errors
    #[error("Failed to parse configuration: {message}")]
    ConfigParse { message: String },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Missing credential: set the {name} environment variable")]
    MissingCredential { name: String },

    // Document errors
    #[error("Failed to extract text from page {page}: {message}")]
    Extraction { page: usize, message: String },

    // Remote service errors (completion and speech)
    #[error("{service} service error: {message}")]
    Service { service: String, message: String },

    #[error("Input of {len} characters exceeds the per-call limit of {limit}")]
    InputTooLarge { len: usize, limit: usize },

    // Pipeline errors
    #[error("Page {page} was published twice")]
    PublishConflict { page: usize },

    #[error("Processing of page {page} was cancelled")]
    Cancelled { page: usize },

    #[error("Page {page} is not ready")]
    NotReady { page: usize },

    // Playback errors
    #[error("Playback failed: {message}")]
    Playback { message: String },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

impl PagecastError {
    /// Shorthand for a failed call to a remote service.
    pub fn service(service: &str, message: impl Into<String>) -> Self {
        Self::Service {
            service: service.to_string(),
            message: message.into(),
        }
    }

    /// Whether this error must abort the whole run rather than a single page.
    ///
    /// Only a double publish qualifies: it means the orchestrator scheduled
    /// the same page twice.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::PublishConflict { .. })
    }
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, PagecastError>;
