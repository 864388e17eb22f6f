use serde::Serialize;
use tera::{Context, Tera};

use super::markdown::TocEntry;

/// Name the page template is registered under inside Tera.
///
/// The `.html` suffix turns on autoescaping, so `title` is escaped and
/// the body must be marked `safe` by the template.
const PAGE_TEMPLATE: &str = "page.html";

#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    #[error("failed to parse template: {0}")]
    Parse(#[source] tera::Error),

    #[error("failed to render template: {0}")]
    Render(#[source] tera::Error),
}

/// The template renderer, wrapping Tera.
pub struct Renderer {
    tera: Tera,
}

impl Renderer {
    /// Parse the page template from its source text.
    pub fn from_source(source: &str) -> Result<Self, RenderError> {
        let mut tera = Tera::default();
        tera.add_raw_template(PAGE_TEMPLATE, source)
            .map_err(RenderError::Parse)?;
        Ok(Self { tera })
    }

    /// Render a document through the page template.
    pub fn render_page(&self, document: &RenderedDocument) -> Result<String, RenderError> {
        let context = Context::from_serialize(document).map_err(RenderError::Render)?;
        self.tera
            .render(PAGE_TEMPLATE, &context)
            .map_err(RenderError::Render)
    }
}

/// Context passed to the page template.
#[derive(Debug, Serialize)]
pub struct RenderedDocument {
    pub title: String,
    /// HTML fragment rendered from the markdown source
    pub body: String,
    /// Table of contents for the document
    pub toc: Vec<TocEntry>,
}
