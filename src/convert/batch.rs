use std::collections::HashMap;
use std::io::ErrorKind;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::{self, JoinError, JoinSet};

use crate::config::{ConfigError, ConvertConfig};

use super::clean::clean_stale_outputs;
use super::paths::{MARKDOWN_EXTENSION, ScanError, list_by_extension};
use super::pipeline::ConvertError;
use super::worker::{ConversionOutcome, Converter};

#[derive(thiserror::Error, Debug)]
pub enum DirectoryError {
    #[error("directory does not exist: {0}")]
    NotFound(PathBuf),

    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("failed to inspect {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(thiserror::Error, Debug)]
pub enum BatchError {
    #[error(transparent)]
    Directory(#[from] DirectoryError),

    #[error("failed to clean stale outputs: {0}")]
    Clean(#[source] ScanError),

    #[error("failed to discover markdown files: {0}")]
    Discover(#[source] ScanError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Summary of a finished batch.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchReport {
    /// Stale HTML files removed before converting
    pub removed: usize,
    pub succeeded: usize,
    pub failed: usize,
}

pub struct Batch {
    directory: PathBuf,
    jobs: Option<NonZeroUsize>,
    converter: Arc<Converter>,
}

impl Batch {
    pub fn new(config: ConvertConfig) -> Result<Self, BatchError> {
        let markdown = config.markdown.options()?;
        Ok(Self {
            directory: config.directory,
            jobs: config.jobs,
            converter: Arc::new(Converter::new(config.assets, markdown)),
        })
    }

    pub async fn run(&self) -> Result<BatchReport, BatchError> {
        // Batch flow:
        // 1. Validate the target directory
        // 2. Delete stale HTML outputs
        // 3. Discover markdown inputs
        // 4. Convert every input concurrently and report as each finishes

        validate_directory(&self.directory).await?;

        let removed = clean_stale_outputs(&self.directory)
            .await
            .map_err(BatchError::Clean)?;

        let inputs =
            list_by_extension(&self.directory, MARKDOWN_EXTENSION).map_err(BatchError::Discover)?;
        tracing::debug!(
            directory = %self.directory.display(),
            removed,
            inputs = inputs.len(),
            "starting conversion"
        );

        let mut report = BatchReport {
            removed,
            ..Default::default()
        };

        let (mut tasks, mut pending) = self.spawn_all(inputs);
        while let Some(joined) = tasks.join_next_with_id().await {
            let outcome = match joined {
                Ok((id, outcome)) => {
                    pending.remove(&id);
                    outcome
                }
                Err(e) => match failed_task(&mut pending, e) {
                    Some(outcome) => outcome,
                    None => {
                        report.failed += 1;
                        continue;
                    }
                },
            };

            tracing::debug!(
                input = %outcome.input().display(),
                success = outcome.is_success(),
                "job finished"
            );
            if outcome.is_success() {
                report.succeeded += 1;
                println!("{outcome}");
            } else {
                report.failed += 1;
                eprintln!("{outcome}");
            }
        }

        tracing::debug!(
            removed = report.removed,
            succeeded = report.succeeded,
            failed = report.failed,
            "conversion finished"
        );
        Ok(report)
    }

    /// Start one task per input, optionally gated by a semaphore.
    ///
    /// Returns the tasks together with the input each task id belongs to.
    fn spawn_all(
        &self,
        inputs: Vec<PathBuf>,
    ) -> (JoinSet<ConversionOutcome>, HashMap<task::Id, PathBuf>) {
        let limit = self.jobs.map(|n| Arc::new(Semaphore::new(n.get())));
        let mut tasks = JoinSet::new();
        let mut pending = HashMap::with_capacity(inputs.len());

        for input in inputs {
            let converter = Arc::clone(&self.converter);
            let limit = limit.clone();
            let task_input = input.clone();

            let handle = tasks.spawn(async move {
                // Held until the blocking conversion finishes
                let _permit = match limit {
                    Some(semaphore) => semaphore.acquire_owned().await.ok(),
                    None => None,
                };

                let blocking_input = task_input.clone();
                match task::spawn_blocking(move || converter.convert(blocking_input)).await {
                    Ok(outcome) => outcome,
                    Err(e) => ConversionOutcome::Failure {
                        input: task_input,
                        error: ConvertError::Panicked(e.to_string()),
                    },
                }
            });
            pending.insert(handle.id(), input);
        }

        (tasks, pending)
    }
}

/// Turn a task that did not complete into a failure for its input.
fn failed_task(
    pending: &mut HashMap<task::Id, PathBuf>,
    error: JoinError,
) -> Option<ConversionOutcome> {
    match pending.remove(&error.id()) {
        Some(input) => Some(ConversionOutcome::Failure {
            input,
            error: ConvertError::Panicked(error.to_string()),
        }),
        None => {
            tracing::error!(error = %error, "conversion task did not complete");
            None
        }
    }
}

/// Check that `path` exists, is accessible and is a directory.
///
/// Each check returns as soon as it fails.
pub async fn validate_directory(path: &Path) -> Result<(), DirectoryError> {
    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|e| directory_error(path, e))?;

    if !metadata.is_dir() {
        return Err(DirectoryError::NotADirectory(path.to_path_buf()));
    }

    Ok(())
}

fn directory_error(path: &Path, error: std::io::Error) -> DirectoryError {
    match error.kind() {
        ErrorKind::NotFound => DirectoryError::NotFound(path.to_path_buf()),
        ErrorKind::PermissionDenied => DirectoryError::PermissionDenied(path.to_path_buf()),
        _ => DirectoryError::Io {
            path: path.to_path_buf(),
            source: error,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{AssetStore, EmbeddedAssets, MemoryAssets, TEMPLATE_ASSET};
    use crate::config::MarkdownConfig;

    fn config(directory: &Path, assets: Arc<dyn AssetStore>) -> ConvertConfig {
        ConvertConfig {
            directory: directory.to_path_buf(),
            jobs: None,
            assets,
            markdown: MarkdownConfig::default(),
        }
    }

    fn html_outputs(dir: &Path) -> Vec<PathBuf> {
        list_by_extension(dir, "html").unwrap()
    }

    fn is_timestamped_output(path: &Path, base: &str) -> bool {
        let name = path.file_name().unwrap().to_str().unwrap();
        let Some(stamp) = name
            .strip_prefix(&format!("{base}_"))
            .and_then(|rest| rest.strip_suffix(".html"))
        else {
            return false;
        };
        chrono::NaiveDateTime::parse_from_str(stamp, "%Y-%m-%d_%H%M%S").is_ok()
    }

    #[tokio::test]
    async fn test_converts_and_replaces_stale_outputs() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.md"), "# Hi").unwrap();
        std::fs::write(dir.path().join("old.html"), "stale").unwrap();

        let batch = Batch::new(config(dir.path(), Arc::new(EmbeddedAssets))).unwrap();
        let report = batch.run().await.unwrap();

        assert_eq!(
            report,
            BatchReport {
                removed: 1,
                succeeded: 1,
                failed: 0
            }
        );
        assert!(!dir.path().join("old.html").exists());
        assert_eq!(std::fs::read_to_string(dir.path().join("a.md")).unwrap(), "# Hi");

        let outputs = html_outputs(dir.path());
        assert_eq!(outputs.len(), 1);
        assert!(is_timestamped_output(&outputs[0], "a"));

        let html = std::fs::read_to_string(&outputs[0]).unwrap();
        assert!(html.contains("<title>a</title>"));
        assert!(html.contains("<h1"));
    }

    #[tokio::test]
    async fn test_one_output_per_input() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["one", "two", "three", "four"] {
            std::fs::write(dir.path().join(format!("{name}.md")), format!("# {name}")).unwrap();
        }

        let batch = Batch::new(config(dir.path(), Arc::new(EmbeddedAssets))).unwrap();
        let report = batch.run().await.unwrap();

        assert_eq!(report.succeeded, 4);
        let outputs = html_outputs(dir.path());
        assert_eq!(outputs.len(), 4);
        for name in ["one", "two", "three", "four"] {
            assert!(outputs.iter().any(|p| is_timestamped_output(p, name)));
            assert!(dir.path().join(format!("{name}.md")).exists());
        }
    }

    #[tokio::test]
    async fn test_bounded_jobs_complete_every_input() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..10 {
            std::fs::write(dir.path().join(format!("doc{i}.md")), "text").unwrap();
        }

        let mut cfg = config(dir.path(), Arc::new(EmbeddedAssets));
        cfg.jobs = NonZeroUsize::new(2);
        let report = Batch::new(cfg).unwrap().run().await.unwrap();

        assert_eq!(report.succeeded, 10);
        assert_eq!(html_outputs(dir.path()).len(), 10);
    }

    #[tokio::test]
    async fn test_empty_directory_still_cleans() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("old.html"), "stale").unwrap();

        let batch = Batch::new(config(dir.path(), Arc::new(EmbeddedAssets))).unwrap();
        let report = batch.run().await.unwrap();

        assert_eq!(
            report,
            BatchReport {
                removed: 1,
                succeeded: 0,
                failed: 0
            }
        );
        assert!(html_outputs(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_missing_template_fails_each_job() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.md"), "# A").unwrap();
        std::fs::write(dir.path().join("b.md"), "# B").unwrap();

        let batch = Batch::new(config(dir.path(), Arc::new(MemoryAssets::new()))).unwrap();
        let report = batch.run().await.unwrap();

        assert_eq!(report.succeeded, 0);
        assert_eq!(report.failed, 2);
        assert!(html_outputs(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_malformed_template_fails_each_job() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.md"), "# A").unwrap();

        let assets = MemoryAssets::new().with_asset(TEMPLATE_ASSET, "{% if %}");
        let batch = Batch::new(config(dir.path(), Arc::new(assets))).unwrap();
        let report = batch.run().await.unwrap();

        assert_eq!(report.failed, 1);
    }

    #[tokio::test]
    async fn test_directory_input_fails_alone() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.md"), "# A").unwrap();
        std::fs::create_dir(dir.path().join("drafts.md")).unwrap();

        let batch = Batch::new(config(dir.path(), Arc::new(EmbeddedAssets))).unwrap();
        let report = batch.run().await.unwrap();

        assert_eq!(report.succeeded, 1);
        assert_eq!(report.failed, 1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_unreadable_input_fails_alone() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let locked = dir.path().join("b.md");
        std::fs::write(&locked, "# B").unwrap();
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o000)).unwrap();
        if std::fs::read(&locked).is_ok() {
            // Running with privileges that ignore file modes
            return;
        }
        std::fs::write(dir.path().join("a.md"), "# A").unwrap();

        let batch = Batch::new(config(dir.path(), Arc::new(EmbeddedAssets))).unwrap();
        let report = batch.run().await.unwrap();

        assert_eq!(report.succeeded, 1);
        assert_eq!(report.failed, 1);
        let outputs = html_outputs(dir.path());
        assert_eq!(outputs.len(), 1);
        assert!(is_timestamped_output(&outputs[0], "a"));

        let outcome = batch.converter.convert(locked.clone());
        assert_eq!(
            outcome.to_string(),
            format!(
                "Failed to convert {}: permission denied: {}",
                locked.display(),
                locked.display()
            )
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_utf8_directory_name() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join(OsStr::from_bytes(b"notes\xff"));
        std::fs::create_dir(&dir).unwrap();
        std::fs::write(dir.join("a.md"), "# A").unwrap();
        std::fs::write(dir.join("old.html"), "stale").unwrap();

        let batch = Batch::new(config(&dir, Arc::new(EmbeddedAssets))).unwrap();
        let report = batch.run().await.unwrap();

        assert_eq!(
            report,
            BatchReport {
                removed: 1,
                succeeded: 1,
                failed: 0
            }
        );
        assert!(!dir.join("old.html").exists());
        let outputs = html_outputs(&dir);
        assert_eq!(outputs.len(), 1);
        assert!(is_timestamped_output(&outputs[0], "a"));
    }

    #[tokio::test]
    async fn test_failed_task_names_its_input() {
        let input = PathBuf::from("/notes/a.md");
        let mut tasks: JoinSet<ConversionOutcome> = JoinSet::new();
        let handle = tasks.spawn(async { panic!("boom") });
        let mut pending = HashMap::from([(handle.id(), input.clone())]);

        let error = tasks.join_next_with_id().await.unwrap().unwrap_err();
        let outcome = failed_task(&mut pending, error).unwrap();

        assert!(!outcome.is_success());
        assert_eq!(outcome.input(), input.as_path());
        assert!(
            outcome
                .to_string()
                .starts_with("Failed to convert /notes/a.md: conversion task panicked")
        );
        assert!(pending.is_empty());
    }

    #[test]
    fn test_directory_error_causes() {
        let path = Path::new("/notes");

        let error = directory_error(path, ErrorKind::PermissionDenied.into());
        assert!(matches!(&error, DirectoryError::PermissionDenied(p) if p == path));
        assert_eq!(error.to_string(), "permission denied: /notes");

        let error = directory_error(path, ErrorKind::NotFound.into());
        assert_eq!(error.to_string(), "directory does not exist: /notes");

        let error = directory_error(path, ErrorKind::InvalidData.into());
        assert!(matches!(error, DirectoryError::Io { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_unsearchable_parent_is_permission_denied() {
        use std::os::unix::fs::PermissionsExt;

        let root = tempfile::tempdir().unwrap();
        let locked = root.path().join("locked");
        let target = locked.join("notes");
        std::fs::create_dir_all(&target).unwrap();
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o600)).unwrap();

        let result = validate_directory(&target).await;
        let searchable = std::fs::metadata(&target).is_ok();
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o700)).unwrap();
        if searchable {
            // Running with privileges that ignore directory modes
            return;
        }

        let error = result.unwrap_err();
        assert!(matches!(&error, DirectoryError::PermissionDenied(p) if p == &target));
        assert_eq!(
            error.to_string(),
            format!("permission denied: {}", target.display())
        );
    }

    #[tokio::test]
    async fn test_missing_directory_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");

        let batch = Batch::new(config(&missing, Arc::new(EmbeddedAssets))).unwrap();
        let result = batch.run().await;

        assert!(matches!(
            result,
            Err(BatchError::Directory(DirectoryError::NotFound(_)))
        ));
        assert!(!missing.exists());
    }

    #[tokio::test]
    async fn test_file_is_not_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.md");
        std::fs::write(&file, "# A").unwrap();

        let result = validate_directory(&file).await;
        assert!(matches!(result, Err(DirectoryError::NotADirectory(_))));
    }

    #[tokio::test]
    async fn test_invalid_markdown_config() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = config(dir.path(), Arc::new(EmbeddedAssets));
        cfg.markdown.extensions.push("emoji".to_string());

        assert!(matches!(Batch::new(cfg), Err(BatchError::Config(_))));
    }
}
