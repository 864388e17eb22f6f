//! Markdown rendering stage.

use crate::convert::markdown::render_markdown;
use crate::convert::pipeline::{ConversionJob, ConvertError, PipelineContext, Stage};

/// Stage that renders the raw input to an HTML fragment.
///
/// Invalid UTF-8 is replaced rather than rejected, so this stage never
/// fails. After this stage `job.content` contains HTML and `job.toc`
/// contains the extracted headings.
pub struct MarkdownStage;

impl Stage for MarkdownStage {
    fn name(&self) -> &'static str {
        "markdown"
    }

    fn process(&self, job: &mut ConversionJob, ctx: &PipelineContext) -> Result<(), ConvertError> {
        let source = String::from_utf8_lossy(&job.raw);
        let output = render_markdown(&source, &ctx.markdown);

        job.content = output.html;
        job.toc = output.toc;

        Ok(())
    }
}
