//! The job type that flows through the pipeline.

use std::path::PathBuf;

use crate::convert::markdown::TocEntry;
use crate::convert::paths::title_for;

/// One Markdown file being converted.
///
/// State evolves through the stages:
///
/// 1. Initially: only `input` and `title` are set
/// 2. After load: `raw` holds the file bytes
/// 3. After markdown: `content` = HTML fragment, `toc` = populated
/// 4. After template: `output_html` = final page HTML
/// 5. After write: `output_path` = where the page was written
#[derive(Debug)]
pub struct ConversionJob {
    /// Path of the Markdown input
    pub input: PathBuf,

    /// Document title (file name without `.md`)
    pub title: String,

    /// Raw file content
    pub raw: Vec<u8>,

    /// Rendered HTML fragment
    pub content: String,

    /// Table of contents extracted during markdown rendering.
    pub toc: Vec<TocEntry>,

    /// Final HTML output after template rendering.
    pub output_html: Option<String>,

    /// Path the output was written to.
    pub output_path: Option<PathBuf>,
}

impl ConversionJob {
    pub fn new(input: PathBuf) -> Self {
        let title = title_for(&input);
        Self {
            input,
            title,
            raw: Vec::new(),
            content: String::new(),
            toc: Vec::new(),
            output_html: None,
            output_path: None,
        }
    }
}
