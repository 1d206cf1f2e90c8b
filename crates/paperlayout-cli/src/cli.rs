use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use paperlayout::SectionKind;

/// Reconstruct the layout of scientific PDFs from layout detections.
#[derive(Debug, Parser)]
#[command(name = "paperlayout", about, version)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Inputs shared by every subcommand.
#[derive(Debug, Args)]
pub struct InputArgs {
    /// Path to the PDF file
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Layout detections CSV
    /// (page_number, order, class_id, confidence, x0, y0, x1, y1)
    #[arg(long, value_name = "CSV")]
    pub detections: PathBuf,

    /// Resolution the detection coordinates are expressed at
    #[arg(long, default_value_t = 300.0)]
    pub dpi: f64,

    /// JSON file overriding engine options
    #[arg(long, value_name = "JSON")]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Write a copy of the PDF with every region outlined and labelled
    Annotate {
        #[command(flatten)]
        input: InputArgs,

        /// Output PDF (default: FILE_annotated.pdf)
        #[arg(short, long, value_name = "OUT")]
        output: Option<PathBuf>,
    },

    /// Write a copy of the PDF with running headers, footers and page
    /// furniture removed
    Clean {
        #[command(flatten)]
        input: InputArgs,

        /// Output PDF (default: FILE_cleaned.pdf)
        #[arg(short, long, value_name = "OUT")]
        output: Option<PathBuf>,
    },

    /// Write a ZIP archive of figure images
    Figures {
        #[command(flatten)]
        input: InputArgs,

        /// Output archive (default: FILE_figures.zip)
        #[arg(short, long, value_name = "OUT")]
        output: Option<PathBuf>,
    },

    /// Write a ZIP archive of table images
    Tables {
        #[command(flatten)]
        input: InputArgs,

        /// Output archive (default: FILE_tables.zip)
        #[arg(short, long, value_name = "OUT")]
        output: Option<PathBuf>,
    },

    /// Print the reading-order transcript of the content regions
    Text {
        #[command(flatten)]
        input: InputArgs,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Output file (default: stdout)
        #[arg(short, long, value_name = "OUT")]
        output: Option<PathBuf>,
    },

    /// Write a Markdown rendition plus the images it links to
    Markdown {
        #[command(flatten)]
        input: InputArgs,

        /// Output Markdown file; images are written next to it
        /// (default: FILE.md)
        #[arg(short, long, value_name = "OUT")]
        output: Option<PathBuf>,
    },

    /// Print the merged, ordered regions as a detections CSV at --dpi
    Detections {
        #[command(flatten)]
        input: InputArgs,

        /// Output file (default: stdout)
        #[arg(short, long, value_name = "OUT")]
        output: Option<PathBuf>,
    },

    /// Print named sections of the transcript
    Sections {
        #[command(flatten)]
        input: InputArgs,

        /// Section to extract, repeatable
        /// (default: methods, results, discussion, data_availability)
        #[arg(long = "section", value_name = "NAME", value_parser = parse_section)]
        sections: Vec<SectionKind>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Output file (default: stdout)
        #[arg(short, long, value_name = "OUT")]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

fn parse_section(name: &str) -> Result<SectionKind, String> {
    SectionKind::from_name(name).ok_or_else(|| {
        let known: Vec<&str> = SectionKind::ALL.iter().map(|kind| kind.name()).collect();
        format!("unknown section '{name}' (expected one of: {})", known.join(", "))
    })
}
