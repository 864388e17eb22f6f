//! The conversion worker: one Markdown file in, one outcome out.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::assets::AssetStore;
use crate::config::MarkdownOptions;

use super::pipeline::{ConversionJob, ConvertError, Pipeline, PipelineContext};

/// The result of converting one file.
#[derive(Debug)]
pub enum ConversionOutcome {
    Success { input: PathBuf, output: PathBuf },
    Failure { input: PathBuf, error: ConvertError },
}

impl ConversionOutcome {
    pub fn input(&self) -> &Path {
        match self {
            Self::Success { input, .. } | Self::Failure { input, .. } => input,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

impl fmt::Display for ConversionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success { input, output } => {
                write!(f, "Converted {} -> {}", input.display(), output.display())
            }
            Self::Failure { input, error } => {
                write!(f, "Failed to convert {}: {}", input.display(), error)
            }
        }
    }
}

/// Runs the conversion pipeline for individual files.
///
/// Holds only read-only state, so one instance is shared by every job.
pub struct Converter {
    pipeline: Pipeline,
    assets: Arc<dyn AssetStore>,
    markdown: MarkdownOptions,
}

impl Converter {
    pub fn new(assets: Arc<dyn AssetStore>, markdown: MarkdownOptions) -> Self {
        let pipeline = Pipeline::default_pipeline();
        tracing::debug!(stages = ?pipeline.stage_names(), "conversion pipeline ready");
        Self {
            pipeline,
            assets,
            markdown,
        }
    }

    /// Convert one file. Never fails as a whole: errors become a
    /// [`ConversionOutcome::Failure`] for this input only.
    ///
    /// Blocks on filesystem I/O; call from a blocking-capable thread.
    pub fn convert(&self, input: PathBuf) -> ConversionOutcome {
        let ctx = PipelineContext::new(self.assets.as_ref(), self.markdown);
        let mut job = ConversionJob::new(input);

        match self.pipeline.run(&mut job, &ctx) {
            Ok(()) => match job.output_path {
                Some(output) => ConversionOutcome::Success {
                    input: job.input,
                    output,
                },
                None => ConversionOutcome::Failure {
                    error: ConvertError::stage("write", "pipeline finished without an output path"),
                    input: job.input,
                },
            },
            Err(error) => ConversionOutcome::Failure {
                input: job.input,
                error,
            },
        }
    }
}
