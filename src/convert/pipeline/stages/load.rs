//! Input validation and reading.

use std::io::ErrorKind;
use std::path::Path;

use crate::convert::pipeline::{ConversionJob, ConvertError, PipelineContext, Stage};

/// Stage that checks the input is a readable regular file and loads it.
///
/// Each check short-circuits, so a permission error is never reported as
/// a file-type error. After this stage `job.raw` holds the file bytes.
pub struct LoadStage;

impl Stage for LoadStage {
    fn name(&self) -> &'static str {
        "load"
    }

    fn process(&self, job: &mut ConversionJob, _ctx: &PipelineContext) -> Result<(), ConvertError> {
        let path = &job.input;

        let metadata = std::fs::metadata(path).map_err(|e| inspect_error(path, e))?;
        if !metadata.is_file() {
            return Err(ConvertError::NotRegularFile(path.clone()));
        }

        job.raw = std::fs::read(path).map_err(|source| match source.kind() {
            ErrorKind::PermissionDenied => ConvertError::PermissionDenied(path.clone()),
            _ => ConvertError::Read {
                path: path.clone(),
                source,
            },
        })?;

        Ok(())
    }
}

/// Map a failed metadata lookup to its distinct cause.
fn inspect_error(path: &Path, error: std::io::Error) -> ConvertError {
    match error.kind() {
        ErrorKind::NotFound => ConvertError::NotFound(path.to_path_buf()),
        ErrorKind::PermissionDenied => ConvertError::PermissionDenied(path.to_path_buf()),
        _ => ConvertError::Metadata {
            path: path.to_path_buf(),
            source: error,
        },
    }
}
