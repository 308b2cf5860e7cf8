//! unzipr CLI - ZIP extraction with background file closing
//!
//! # Examples
//!
//! ```bash
//! # Extract into the current directory
//! unzipr archive.zip
//!
//! # Extract into a target directory
//! unzipr -d out archive.zip
//!
//! # Quiet mode
//! unzipr -q archive.zip
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use unzipr::{Error, Extractor};

#[derive(Parser)]
#[command(
    name = "unzipr",
    about = "Extract a ZIP archive, overlapping file closes with extraction",
    version
)]
struct Cli {
    /// Archive file to extract
    archive: PathBuf,

    /// Specific entry names (accepted for unzip compatibility; extraction
    /// is not filtered by them)
    entries: Vec<String>,

    /// Quiet mode - suppress the summary line
    #[arg(short, long)]
    quiet: bool,

    /// Overwrite existing files without prompting (extraction always
    /// overwrites, so this is accepted for compatibility)
    #[arg(short, long)]
    overwrite: bool,

    /// Directory to extract files into
    #[arg(short, long = "dest", value_name = "DIR")]
    dest: Option<PathBuf>,
}

fn main() -> ExitCode {
    // try_parse so malformed invocations exit 1; --help and --version
    // still come through here and must exit 0.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
            let _ = e.print();
            return code;
        }
    };

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn run(cli: Cli) -> Result<(), Error> {
    // Overwrite is the only behavior on offer anyway.
    let _ = cli.overwrite;

    if !cli.entries.is_empty() && !cli.quiet {
        eprintln!("note: entry filters are ignored; extracting all entries");
    }

    let mut extractor = Extractor::new();
    if let Some(dir) = cli.dest.clone() {
        extractor = extractor.destination(dir);
    }

    let report = extractor.extract(&cli.archive)?;

    if !cli.quiet {
        println!(
            "Extracted {} files ({} bytes) from {}",
            report.files_extracted,
            report.bytes_written,
            cli.archive.display()
        );
    }

    Ok(())
}
