//! Page template rendering stage.

use crate::assets::TEMPLATE_ASSET;
use crate::convert::pipeline::{ConversionJob, ConvertError, PipelineContext, Stage};
use crate::convert::render::{RenderedDocument, Renderer};

/// Stage that wraps the rendered fragment in the page template.
///
/// The template is fetched from the asset store and parsed per job, so a
/// missing or malformed template fails each job on its own.
///
/// After this stage, `job.output_html` contains the complete HTML page.
pub struct TemplateStage;

impl Stage for TemplateStage {
    fn name(&self) -> &'static str {
        "template"
    }

    fn process(&self, job: &mut ConversionJob, ctx: &PipelineContext) -> Result<(), ConvertError> {
        let template = ctx
            .assets
            .get(TEMPLATE_ASSET)
            .ok_or_else(|| ConvertError::TemplateMissing(TEMPLATE_ASSET.to_string()))?;
        let renderer = Renderer::from_source(&String::from_utf8_lossy(&template))?;

        let document = RenderedDocument {
            title: job.title.clone(),
            body: std::mem::take(&mut job.content),
            toc: job.toc.clone(),
        };
        let html = renderer.render_page(&document)?;

        job.content = document.body;
        job.output_html = Some(html);

        Ok(())
    }
}
