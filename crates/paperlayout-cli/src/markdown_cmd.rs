use std::path::Path;

use crate::cli::InputArgs;
use crate::shared::{default_output, fail, load_job, report, with_newline, write_file};

/// Write `OUT.md`; image paths in the bundle are relative to its directory.
pub fn run(input: &InputArgs, output: Option<&Path>) -> Result<(), i32> {
    let job = load_job(input)?;
    let bundle = report(job.engine.markdown(&job.pdf, &job.stem).map_err(fail)?);
    let path = output.map_or_else(|| default_output(&input.file, ".md"), Path::to_path_buf);
    let base = path.parent().unwrap_or_else(|| Path::new(""));
    for (relative, png) in &bundle.images {
        write_file(&base.join(relative), png)?;
    }
    write_file(&path, with_newline(bundle.markdown).as_bytes())
}
