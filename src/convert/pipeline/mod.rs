//! Conversion pipeline for a single Markdown file.
//!
//! A job moves through a series of stages:
//! 1. Load (validate the input path and read its bytes)
//! 2. Markdown rendering (to an HTML fragment with TOC)
//! 3. Template rendering (page template wrapper)
//! 4. File writing (timestamped output next to the input)
//!
//! The first failing stage ends the job; nothing is retried.

mod context;
mod document;
mod error;
mod stages;

pub use context::PipelineContext;
pub use document::ConversionJob;
pub use error::ConvertError;

use stages::{LoadStage, MarkdownStage, TemplateStage, WriteStage};

/// A stage in the conversion pipeline.
///
/// Each stage receives the job by mutable reference and advances its
/// state in place before the next stage runs.
pub trait Stage: Send + Sync {
    /// Unique name for this stage (used in diagnostics).
    fn name(&self) -> &'static str;

    /// Process one job through this stage.
    fn process(&self, job: &mut ConversionJob, ctx: &PipelineContext) -> Result<(), ConvertError>;
}

/// The conversion pipeline.
///
/// The default pipeline is: load → markdown → template → write.
pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    /// Create an empty pipeline with no stages.
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// Create the default pipeline with standard stages.
    pub fn default_pipeline() -> Self {
        let mut pipeline = Self::new();
        pipeline.add_stage(LoadStage);
        pipeline.add_stage(MarkdownStage);
        pipeline.add_stage(TemplateStage);
        pipeline.add_stage(WriteStage);
        pipeline
    }

    /// Add a stage to the end of the pipeline.
    pub fn add_stage<S: Stage + 'static>(&mut self, stage: S) -> &mut Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// Run every stage on the job, stopping at the first error.
    pub fn run(&self, job: &mut ConversionJob, ctx: &PipelineContext) -> Result<(), ConvertError> {
        for stage in &self.stages {
            tracing::debug!(stage = stage.name(), input = %job.input.display(), "running stage");
            stage.process(job, ctx)?;
        }
        Ok(())
    }

    /// Get the names of all stages in order.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::default_pipeline()
    }
}
