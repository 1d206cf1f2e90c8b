use std::path::Path;

use crate::cli::InputArgs;
use crate::shared::{fail, load_job, report, write_output};

/// Re-emit the merged and ordered regions at the input's `--dpi`.
pub fn run(input: &InputArgs, output: Option<&Path>) -> Result<(), i32> {
    let job = load_job(input)?;
    let csv = job.engine.detections_csv(&job.pdf, input.dpi).map_err(fail)?;
    write_output(output, report(csv).as_bytes())
}
