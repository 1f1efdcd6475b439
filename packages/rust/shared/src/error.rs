//! Error types for pagemark.
//!
//! Library crates use [`PagemarkError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all pagemark operations.
#[derive(Debug, thiserror::Error)]
pub enum PagemarkError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// The document could not be fetched (transport error or non-success status).
    #[error("fetch failed for {url}: {message}")]
    FetchFailure { url: String, message: String },

    /// No selection strategy produced a content root, not even `<body>`.
    #[error("no content root found")]
    NoContentRoot,

    /// Extraction ran to completion but nothing survived cleanup.
    #[error("no content extracted")]
    NoContent,

    /// The document parser rejected the input.
    #[error("malformed markup: {message}")]
    MalformedMarkup { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PagemarkError>;

impl PagemarkError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a fetch failure for the given URL.
    pub fn fetch(url: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::FetchFailure {
            url: url.into(),
            message: msg.into(),
        }
    }

    /// Create a malformed-markup error from any displayable message.
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedMarkup {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error is the legitimate "nothing to extract" outcome
    /// rather than a pipeline or transport defect.
    pub fn is_no_content(&self) -> bool {
        matches!(self, Self::NoContent)
    }
}
