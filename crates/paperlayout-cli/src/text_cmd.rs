use std::path::Path;

use crate::cli::{InputArgs, OutputFormat};
use crate::shared::{fail, load_job, report, with_newline, write_output};

pub fn run(input: &InputArgs, format: OutputFormat, output: Option<&Path>) -> Result<(), i32> {
    let job = load_job(input)?;
    let artifact = match format {
        OutputFormat::Text => job.engine.transcript(&job.pdf),
        OutputFormat::Json => job.engine.transcript_json(&job.pdf),
    }
    .map_err(fail)?;
    let text = with_newline(report(artifact));
    write_output(output, text.as_bytes())
}
