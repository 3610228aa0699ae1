//! Error taxonomy shared by the library modules.
//!
//! Every `Display` string here may reach the calling agent, so messages are
//! drawn from small fixed sets and never carry file paths, URLs of internal
//! resources, or upstream error text.

use thiserror::Error;

/// Rejection reasons for a caller-supplied documentation path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("Invalid path: too long")]
    TooLong,
    #[error("Invalid path: empty path")]
    Empty,
    #[error("Invalid path: malformed encoding")]
    MalformedEncoding,
    #[error("Invalid path: path traversal not allowed")]
    Traversal,
    #[error("Invalid path: control characters not allowed")]
    ControlCharacter,
    #[error("Invalid path: relative path not allowed")]
    RelativeSegment,
    #[error("Invalid path: contains disallowed characters")]
    DisallowedCharacter,
}

/// Failures of the remote documentation fetch.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error(transparent)]
    InvalidPath(#[from] PathError),
    #[error("Invalid documentation URL")]
    DisallowedUrl,
    #[error("Only HTTPS is allowed")]
    InsecureScheme,
    #[error("Request timed out")]
    Timeout,
    #[error("Response too large")]
    TooLarge,
    #[error("HTTP {0}")]
    Status(u16),
    #[error("Failed to fetch documentation")]
    Failed,
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else {
            tracing::debug!(error = %err, "upstream request failed");
            FetchError::Failed
        }
    }
}

/// Failures loading a JSON catalog from the data directory.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("Invalid filename")]
    InvalidFilename,
    #[error("File not allowed")]
    NotAllowed,
    #[error("Data file not found")]
    NotFound,
    #[error("Failed to load data file")]
    Invalid,
}

/// A single HTML→Markdown step that could not produce output.
#[derive(Debug, Clone, Error)]
pub enum TransformError {
    #[error("pattern failed to compile: {0}")]
    Pattern(#[from] regex::Error),
    #[error("step panicked")]
    Panicked,
    #[error("{0}")]
    Other(String),
}
