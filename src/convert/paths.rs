//! Path utilities for input discovery and output naming.
//!
//! This module handles:
//! - Listing the `*.md` / `*.html` entries of one directory level
//! - Deriving a document title from an input file name
//! - Deriving the timestamped output path for an input file

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone};

/// Extension of convertible input files.
pub const MARKDOWN_EXTENSION: &str = "md";

/// Extension of generated output files.
pub const HTML_EXTENSION: &str = "html";

/// `chrono` format of the timestamp embedded in output file names.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H%M%S";

#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    #[error("invalid file pattern {pattern}: {source}")]
    Pattern {
        pattern: String,
        source: glob::PatternError,
    },

    #[error("failed to read directory {dir}: {source}")]
    ReadDir {
        dir: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to list files in {dir}: {source}")]
    Entry {
        dir: PathBuf,
        source: std::io::Error,
    },
}

/// List every entry directly inside `dir` whose name matches `*.{extension}`.
///
/// Only file names are matched against the pattern, so the directory path
/// may hold glob metacharacters or bytes that are not UTF-8. Entries are
/// returned in sorted order. Any unreadable entry fails the whole scan.
pub fn list_by_extension(dir: &Path, extension: &str) -> Result<Vec<PathBuf>, ScanError> {
    let pattern_text = format!("*.{extension}");
    let pattern = glob::Pattern::new(&pattern_text).map_err(|source| ScanError::Pattern {
        pattern: pattern_text.clone(),
        source,
    })?;

    let entries = std::fs::read_dir(dir).map_err(|source| ScanError::ReadDir {
        dir: dir.to_path_buf(),
        source,
    })?;

    let mut found = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| ScanError::Entry {
            dir: dir.to_path_buf(),
            source,
        })?;
        if name_matches(&pattern, &entry.file_name()) {
            found.push(entry.path());
        }
    }
    found.sort();
    Ok(found)
}

/// Match a file name against `pattern`.
///
/// A name that is not UTF-8 is matched in its lossy form. Invalid sequences
/// become U+FFFD and the ASCII extension suffix is left intact.
fn name_matches(pattern: &glob::Pattern, name: &OsStr) -> bool {
    match name.to_str() {
        Some(name) => pattern.matches(name),
        None => pattern.matches(&name.to_string_lossy()),
    }
}

/// The document title: the file name with one trailing `.md` stripped.
///
/// # Examples
/// ```ignore
/// title_for(Path::new("/notes/intro.md")) => "intro"
/// title_for(Path::new("/notes/a.md.md")) => "a.md"
/// ```
pub fn title_for(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy())
        .unwrap_or_default();
    name.strip_suffix(".md").unwrap_or(&*name).to_string()
}

/// The output path for an input file converted at `time`.
///
/// # Examples
/// ```ignore
/// output_path_for("/notes/intro.md", 2024-03-09 14:05:07) => "/notes/intro_2024-03-09_140507.html"
/// ```
pub fn output_path_for<Tz>(path: &Path, time: &DateTime<Tz>) -> PathBuf
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let file_name = format!(
        "{}_{}.{}",
        title_for(path),
        time.format(TIMESTAMP_FORMAT),
        HTML_EXTENSION
    );
    path.with_file_name(file_name)
}
