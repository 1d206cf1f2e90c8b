use std::fmt::Display;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use paperlayout::{Artifact, CsvDetections, Engine, EngineOptions};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::InputArgs;

/// Install the stderr log subscriber. `RUST_LOG` applies unless `-v` was
/// given.
pub fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        _ => EnvFilter::new("debug"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Print a fatal error and produce the exit code.
pub fn fail(error: impl Display) -> i32 {
    eprintln!("Error: {error}");
    1
}

/// A loaded PDF plus the engine configured for it.
pub struct Job {
    pub engine: Engine<CsvDetections>,
    pub pdf: Vec<u8>,
    /// Input file name without extension, used to name outputs.
    pub stem: String,
}

/// Read the PDF, the detections and the optional options file.
pub fn load_job(input: &InputArgs) -> Result<Job, i32> {
    if !input.file.exists() {
        eprintln!("Error: file not found: {}", input.file.display());
        return Err(1);
    }
    if !input.detections.exists() {
        eprintln!("Error: file not found: {}", input.detections.display());
        return Err(1);
    }
    if !(input.dpi.is_finite() && input.dpi > 0.0) {
        return Err(fail(format!("--dpi must be positive, got {}", input.dpi)));
    }

    let pdf = fs::read(&input.file).map_err(|e| {
        fail(format!("failed to read {}: {e}", input.file.display()))
    })?;
    let detections = CsvDetections::from_path(&input.detections, input.dpi).map_err(|e| {
        fail(format!("failed to load detections: {e}"))
    })?;
    info!(detections = detections.len(), "detections loaded");

    let options = match &input.config {
        Some(path) => {
            let json = fs::read_to_string(path)
                .map_err(|e| fail(format!("failed to read {}: {e}", path.display())))?;
            EngineOptions::from_json(&json)
                .map_err(|e| fail(format!("invalid config {}: {e}", path.display())))?
        }
        None => EngineOptions::default(),
    };

    Ok(Job {
        engine: Engine::with_options(detections, options),
        pdf,
        stem: file_stem(&input.file),
    })
}

pub fn file_stem(file: &Path) -> String {
    file.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string())
}

/// `FILE` with its extension replaced by `suffix`, in FILE's directory.
pub fn default_output(file: &Path, suffix: &str) -> PathBuf {
    file.with_file_name(format!("{}{suffix}", file_stem(file)))
}

/// Print the artifact's diagnostics as warnings and hand back its value.
pub fn report<T>(artifact: Artifact<T>) -> T {
    for diagnostic in &artifact.diagnostics {
        eprintln!("warning: {diagnostic}");
    }
    artifact.value
}

/// Write to `path`, or to stdout when no path is given.
pub fn write_output(path: Option<&Path>, bytes: &[u8]) -> Result<(), i32> {
    match path {
        Some(path) => write_file(path, bytes),
        None => {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(bytes)
                .and_then(|()| stdout.flush())
                .map_err(|e| fail(format!("failed to write output: {e}")))
        }
    }
}

pub fn write_file(path: &Path, bytes: &[u8]) -> Result<(), i32> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| fail(format!("failed to create {}: {e}", parent.display())))?;
    }
    fs::write(path, bytes)
        .map_err(|e| fail(format!("failed to write {}: {e}", path.display())))?;
    info!(path = %path.display(), bytes = bytes.len(), "output written");
    Ok(())
}

/// Text output always ends with a newline.
pub fn with_newline(mut text: String) -> String {
    if !text.ends_with('\n') {
        text.push('\n');
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_output_sits_next_to_input() {
        assert_eq!(
            default_output(Path::new("papers/smith2020.pdf"), "_cleaned.pdf"),
            PathBuf::from("papers/smith2020_cleaned.pdf")
        );
        assert_eq!(
            default_output(Path::new("paper.pdf"), ".md"),
            PathBuf::from("paper.md")
        );
    }

    #[test]
    fn stem_drops_extension() {
        assert_eq!(file_stem(Path::new("/tmp/a.b.pdf")), "a.b");
    }

    #[test]
    fn newline_is_added_once() {
        assert_eq!(with_newline("a".to_string()), "a\n");
        assert_eq!(with_newline("a\n".to_string()), "a\n");
    }

    #[test]
    fn write_file_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out.txt");
        write_file(&path, b"hello").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"hello");
    }
}
