//! File writing stage.

use std::fs::OpenOptions;
use std::io::Write;

use chrono::Local;

use crate::convert::paths::output_path_for;
use crate::convert::pipeline::{ConversionJob, ConvertError, PipelineContext, Stage};

/// Permission bits for written pages (owner read/write, others read).
#[cfg(unix)]
const OUTPUT_MODE: u32 = 0o644;

/// Stage that writes the final page next to its input.
///
/// The output name embeds the local time of the write at second
/// granularity. An existing file of the same name is truncated.
pub struct WriteStage;

impl Stage for WriteStage {
    fn name(&self) -> &'static str {
        "write"
    }

    fn process(&self, job: &mut ConversionJob, _ctx: &PipelineContext) -> Result<(), ConvertError> {
        let html = job.output_html.as_ref().ok_or_else(|| {
            ConvertError::stage(
                "write",
                format!(
                    "{} has no output HTML (was template stage run?)",
                    job.input.display()
                ),
            )
        })?;

        let output_path = output_path_for(&job.input, &Local::now());

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(OUTPUT_MODE);
        }

        options
            .open(&output_path)
            .and_then(|mut file| file.write_all(html.as_bytes()))
            .map_err(|source| ConvertError::Write {
                path: output_path.clone(),
                source,
            })?;

        job.output_path = Some(output_path);
        Ok(())
    }
}
