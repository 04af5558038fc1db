//! Shared error types for the detection pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for dupscan operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed per-file input. The offending file is skipped and the run
    /// continues; the pipeline surfaces this as a per-file warning.
    #[error("Extraction error in {}: {message}", file.display())]
    Extraction { file: PathBuf, message: String },

    /// Invalid configuration. Fails the run before any extraction begins.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A violated run invariant. Always fatal; signals a defect in the
    /// pipeline, not bad input.
    #[error("Internal invariant violated: {0}")]
    InternalInvariant(String),

    /// IO errors at the binary's input/output edges.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON errors at the corpus/report boundary.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a per-file extraction error.
    pub fn extraction(file: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Extraction {
            file: file.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Create an internal invariant error.
    pub fn invariant(message: impl Into<String>) -> Self {
        Self::InternalInvariant(message.into())
    }

    /// Whether the error is fatal to the whole run.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Error::Extraction { .. })
    }
}

/// Result type alias using our error type.
pub type Result<T> = std::result::Result<T, Error>;
