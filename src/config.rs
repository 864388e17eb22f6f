//! Conversion configuration.
//!
//! Settings are resolved once from the command line before any job runs
//! and are shared read-only by every conversion worker.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use pulldown_cmark::Options;
use crate::assets::{AssetStore, EmbeddedAssets, MemoryAssets, TEMPLATE_ASSET};

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to get current working directory: {0}")]
    CwdFailure(std::io::Error),

    #[error("failed to read template {path}: {source}")]
    TemplateRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid markdown extension: {0}")]
    InvalidExtension(String),
}

/// Everything a batch run needs, resolved from CLI arguments.
pub struct ConvertConfig {
    /// Absolute path of the directory to convert
    pub directory: PathBuf,
    /// Maximum number of concurrent workers (`None` = one per file)
    pub jobs: Option<NonZeroUsize>,
    /// Where the page template is loaded from
    pub assets: Arc<dyn AssetStore>,
    /// Markdown renderer settings
    pub markdown: MarkdownConfig,
}

impl ConvertConfig {
    /// Resolve the configuration.
    ///
    /// A missing directory defaults to the current working directory; a
    /// relative one is joined onto it. A template override is read eagerly
    /// so an unreadable file stops the run before anything is deleted.
    pub fn resolve(
        directory: Option<&Path>,
        jobs: Option<NonZeroUsize>,
        template: Option<&Path>,
    ) -> Result<Self, ConfigError> {
        let cwd = std::env::current_dir().map_err(ConfigError::CwdFailure)?;
        let directory = match directory {
            Some(dir) if dir.is_relative() => cwd.join(dir),
            Some(dir) => dir.to_path_buf(),
            None => cwd,
        };

        let assets: Arc<dyn AssetStore> = match template {
            Some(path) => {
                let bytes = std::fs::read(path).map_err(|source| ConfigError::TemplateRead {
                    path: path.to_path_buf(),
                    source,
                })?;
                Arc::new(MemoryAssets::new().with_asset(TEMPLATE_ASSET, bytes))
            }
            None => Arc::new(EmbeddedAssets),
        };

        let markdown = MarkdownConfig::default();
        // Fail fast on a bad extension list rather than once per job.
        markdown.options()?;

        Ok(Self {
            directory,
            jobs,
            assets,
            markdown,
        })
    }
}

/// Markdown renderer configuration.
#[derive(Debug, Clone)]
pub struct MarkdownConfig {
    /// Enabled extensions, by name
    pub extensions: Vec<String>,
}

fn default_markdown_extensions() -> Vec<String> {
    [
        "tables",
        "strikethrough",
        "smart_punctuation",
        "definition_lists",
        "autolink",
        "heading_ids",
        "heading_attributes",
        "toc",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            extensions: default_markdown_extensions(),
        }
    }
}

/// The parser options and post-processing passes selected by a
/// [`MarkdownConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkdownOptions {
    pub parser: Options,
    pub autolink: bool,
    pub heading_ids: bool,
    pub toc: bool,
}

impl MarkdownConfig {
    /// Translate extension names into renderer options.
    pub fn options(&self) -> Result<MarkdownOptions, ConfigError> {
        let mut options = MarkdownOptions {
            parser: Options::empty(),
            autolink: false,
            heading_ids: false,
            toc: false,
        };
        for extension in &self.extensions {
            match extension.as_str() {
                "definition_lists" => options.parser.insert(Options::ENABLE_DEFINITION_LIST),
                "smart_punctuation" => options.parser.insert(Options::ENABLE_SMART_PUNCTUATION),
                "strikethrough" => options.parser.insert(Options::ENABLE_STRIKETHROUGH),
                "tables" => options.parser.insert(Options::ENABLE_TABLES),
                "heading_attributes" => {
                    options.parser.insert(Options::ENABLE_HEADING_ATTRIBUTES)
                }
                "autolink" => options.autolink = true,
                "heading_ids" => options.heading_ids = true,
                "toc" => options.toc = true,
                other => return Err(ConfigError::InvalidExtension(other.to_string())),
            }
        }
        Ok(options)
    }
}
