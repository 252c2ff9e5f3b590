use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::path::PathBuf;

use portpics::extensions::{self, DEFAULT_CATEGORY};
use portpics::{ExifDateResolver, FileProcessor, FileStatus, Options, RunSummary, TransferMode};

#[derive(Parser)]
#[command(name = "portpics")]
#[command(version)]
#[command(about = "Copy or move pictures into folders named after their EXIF capture date")]
#[command(long_about = "Scans a directory for pictures, reads the EXIF capture date of each one and copies (or moves) it into a destination built from templates.

Placeholders (output directory, name and command):
  %y  year (4 digits)    %m  month (2 digits)    %d  day (2 digits)
  %f  original file name (name and command only; in the command it is the new name)
  %n  running number (name and command only)

Existing files are never overwritten unless --replace is given.")]
struct Cli {
    /// Directory containing the input files
    #[arg(short, long = "indir")]
    indir: PathBuf,

    /// Target directory, may contain %y, %m and %d
    #[arg(short, long = "outdir")]
    outdir: String,

    /// Comma-separated extension categories (jpg, png, tif, heic, raw, srw, cr2, nef, ...)
    #[arg(short, long = "extension", default_value = DEFAULT_CATEGORY)]
    extension: String,

    /// Output file name template
    #[arg(short, long, default_value = "%f")]
    name: String,

    /// Shell command run after each transferred file
    #[arg(short, long)]
    command: Option<String>,

    /// Zero-padding for %n (0 = as wide as the largest number)
    #[arg(long, default_value = "0")]
    digits: usize,

    /// Added to every running number
    #[arg(long, default_value = "0")]
    offset: u64,

    /// Also scan subdirectories
    #[arg(short = 'R', long)]
    recursive: bool,

    /// Also transfer sidecar files (<picture>.xmp)
    #[arg(short, long)]
    sidecar: bool,

    /// Increase verbosity (-v=INFO, -vv=DEBUG, -vvv=TRACE)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress progress output
    #[arg(short, long)]
    quiet: bool,

    /// Replace files that already exist at the destination
    #[arg(short, long)]
    replace: bool,

    /// Move files instead of copying them
    #[arg(short, long)]
    delete: bool,
}

impl Cli {
    fn into_options(self) -> Options {
        Options {
            input_dir: self.indir,
            output_template: self.outdir,
            categories: extensions::parse_list(&self.extension),
            name_template: self.name,
            command_template: self.command,
            digits: self.digits,
            offset: self.offset,
            recursive: self.recursive,
            sidecar: self.sidecar,
            replace: self.replace,
            mode: TransferMode::from_delete_flag(self.delete),
            quiet: self.quiet,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose)?;

    info!("Starting portpics");

    let options = cli.into_options();
    let processor = FileProcessor::new(&options);
    let summary = processor
        .process(&ExifDateResolver::new())
        .context("Nothing was transferred")?;

    print_summary(&summary, options.quiet);
    Ok(())
}

fn setup_logging(verbosity: u8) -> Result<()> {
    let level = match verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::from_default_env()
        .filter_level(level)
        .try_init()
        .context("Failed to initialise logging")?;

    Ok(())
}

fn print_summary(summary: &RunSummary, quiet: bool) {
    if !quiet {
        println!("\nProcessing complete!");
        println!("Files found: {}", summary.discovered);
        println!("Destination folders: {}", summary.folders.len());
        println!("Files skipped (already existed): {}", summary.skipped());
        println!("Files without capture date: {}", summary.undated.len());
        println!("Errors: {}", summary.failed());
        if summary.command_failures() > 0 {
            println!("Failed commands: {}", summary.command_failures());
        }
    }
    println!("Files processed: {}", summary.transferred());

    if summary.failed() > 0 {
        eprintln!("\nErrors:");
        for result in &summary.results {
            if let FileStatus::Failed(error) = &result.status {
                eprintln!("  {}: {}", result.task.source.display(), error);
            }
        }
    }
}
