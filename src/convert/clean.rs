//! Removal of previously generated HTML files.

use std::path::Path;

use super::paths::{HTML_EXTENSION, ScanError, list_by_extension};

/// Delete every `*.html` file directly inside `dir`.
///
/// A file that cannot be deleted is reported and skipped; only a failure to
/// list the directory is an error. Returns the number of files removed.
pub async fn clean_stale_outputs(dir: &Path) -> Result<usize, ScanError> {
    let stale = list_by_extension(dir, HTML_EXTENSION)?;
    let mut removed = 0;

    for path in &stale {
        match tokio::fs::remove_file(path).await {
            Ok(()) => {
                tracing::debug!(path = %path.display(), "removed stale output");
                removed += 1;
            }
            Err(e) => eprintln!("Failed to delete stale output {}: {}", path.display(), e),
        }
    }

    Ok(removed)
}
