//! Read-only state shared by every stage of every job.

use crate::assets::AssetStore;
use crate::config::MarkdownOptions;

/// Shared context for pipeline stages.
pub struct PipelineContext<'a> {
    /// Where the page template is loaded from
    pub assets: &'a dyn AssetStore,

    /// Markdown renderer options
    pub markdown: MarkdownOptions,
}

impl<'a> PipelineContext<'a> {
    pub fn new(assets: &'a dyn AssetStore, markdown: MarkdownOptions) -> Self {
        Self { assets, markdown }
    }
}
