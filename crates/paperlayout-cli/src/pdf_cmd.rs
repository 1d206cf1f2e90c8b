use std::path::Path;

use crate::cli::InputArgs;
use crate::shared::{default_output, fail, load_job, report, write_file};

pub fn annotate(input: &InputArgs, output: Option<&Path>) -> Result<(), i32> {
    let job = load_job(input)?;
    let pdf = job.engine.annotated_pdf(&job.pdf).map_err(fail)?;
    let path = output.map_or_else(|| default_output(&input.file, "_annotated.pdf"), Path::to_path_buf);
    write_file(&path, &report(pdf))
}

pub fn clean(input: &InputArgs, output: Option<&Path>) -> Result<(), i32> {
    let job = load_job(input)?;
    let pdf = job.engine.cleaned_pdf(&job.pdf).map_err(fail)?;
    let path = output.map_or_else(|| default_output(&input.file, "_cleaned.pdf"), Path::to_path_buf);
    write_file(&path, &report(pdf))
}
