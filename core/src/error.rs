//! Error taxonomy for the artifact engine.
//!
//! Discovery and path resolution never raise: missing directories degrade to
//! fewer candidates and parse failures degrade to candidates without parsed
//! content. Validators return structured reports. The CRUD engine is the only
//! layer that converts an `ArtifactError` into a terminal operation outcome.

use std::path::PathBuf;

/// Typed failure kinds surfaced by artifact operations.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("file already exists: {}", path.display())]
    FileAlreadyExists { path: PathBuf },

    #[error("invalid path {}: {reason}", path.display())]
    InvalidPath { path: PathBuf, reason: String },

    /// Validator-level rejection (markdown structure or settings schema).
    #[error("invalid content: {0}")]
    InvalidContent(String),

    /// Codec-level rejection (frontmatter YAML or settings JSON did not parse).
    #[error("parse failure: {0}")]
    ParseFailure(String),

    #[error("permission denied: {}", path.display())]
    PermissionDenied { path: PathBuf },

    /// Catch-all for unexpected I/O failures, with the original error attached.
    #[error("operation failed: {context}")]
    OperationFailed {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl ArtifactError {
    /// Classify an I/O error against the path it touched.
    ///
    /// `NotFound` and `PermissionDenied` get their own kinds so callers can
    /// react to them; everything else collapses into `OperationFailed`.
    pub fn from_io(err: std::io::Error, path: &std::path::Path, context: &str) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => ArtifactError::FileNotFound {
                path: path.to_path_buf(),
            },
            std::io::ErrorKind::PermissionDenied => ArtifactError::PermissionDenied {
                path: path.to_path_buf(),
            },
            _ => ArtifactError::OperationFailed {
                context: format!("{context}: {}", path.display()),
                source: err,
            },
        }
    }

    /// Stable machine-readable code for the error kind.
    pub fn code(&self) -> &'static str {
        match self {
            ArtifactError::FileNotFound { .. } => "file_not_found",
            ArtifactError::FileAlreadyExists { .. } => "file_already_exists",
            ArtifactError::InvalidPath { .. } => "invalid_path",
            ArtifactError::InvalidContent(_) => "invalid_content",
            ArtifactError::ParseFailure(_) => "parse_failure",
            ArtifactError::PermissionDenied { .. } => "permission_denied",
            ArtifactError::OperationFailed { .. } => "operation_failed",
        }
    }
}
