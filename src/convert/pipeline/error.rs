//! Per-job error types.

use std::path::PathBuf;

use crate::convert::render::RenderError;

/// Errors that end a single conversion job.
///
/// None of these affect other jobs or the process exit code.
#[derive(thiserror::Error, Debug)]
pub enum ConvertError {
    #[error("file does not exist: {0}")]
    NotFound(PathBuf),

    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    #[error("not a regular file: {0}")]
    NotRegularFile(PathBuf),

    #[error("failed to inspect {path}: {source}")]
    Metadata {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("template asset not found: {0}")]
    TemplateMissing(String),

    #[error(transparent)]
    Template(#[from] RenderError),

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("stage '{stage}' failed: {message}")]
    Stage { stage: String, message: String },

    #[error("conversion task panicked: {0}")]
    Panicked(String),
}

impl ConvertError {
    /// Create a stage-specific error.
    pub fn stage(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Stage {
            stage: stage.into(),
            message: message.into(),
        }
    }
}
