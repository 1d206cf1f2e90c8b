mod archive_cmd;
mod cli;
mod detections_cmd;
mod markdown_cmd;
mod pdf_cmd;
mod sections_cmd;
mod shared;
mod text_cmd;

use clap::Parser;
use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    shared::init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Annotate { ref input, ref output } => pdf_cmd::annotate(input, output.as_deref()),
        Commands::Clean { ref input, ref output } => pdf_cmd::clean(input, output.as_deref()),
        Commands::Figures { ref input, ref output } => {
            archive_cmd::figures(input, output.as_deref())
        }
        Commands::Tables { ref input, ref output } => archive_cmd::tables(input, output.as_deref()),
        Commands::Text {
            ref input,
            format,
            ref output,
        } => text_cmd::run(input, format, output.as_deref()),
        Commands::Markdown { ref input, ref output } => {
            markdown_cmd::run(input, output.as_deref())
        }
        Commands::Detections { ref input, ref output } => {
            detections_cmd::run(input, output.as_deref())
        }
        Commands::Sections {
            ref input,
            ref sections,
            format,
            ref output,
        } => sections_cmd::run(input, sections, format, output.as_deref()),
    };

    if let Err(code) = result {
        std::process::exit(code);
    }
}
