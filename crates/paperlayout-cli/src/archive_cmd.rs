use std::path::Path;

use crate::cli::InputArgs;
use crate::shared::{default_output, fail, load_job, report, write_file};

pub fn figures(input: &InputArgs, output: Option<&Path>) -> Result<(), i32> {
    let job = load_job(input)?;
    let archive = job.engine.figure_archive(&job.pdf, &job.stem).map_err(fail)?;
    let path = output.map_or_else(|| default_output(&input.file, "_figures.zip"), Path::to_path_buf);
    write_file(&path, &report(archive))
}

pub fn tables(input: &InputArgs, output: Option<&Path>) -> Result<(), i32> {
    let job = load_job(input)?;
    let archive = job.engine.table_archive(&job.pdf, &job.stem).map_err(fail)?;
    let path = output.map_or_else(|| default_output(&input.file, "_tables.zip"), Path::to_path_buf);
    write_file(&path, &report(archive))
}
