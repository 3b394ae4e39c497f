use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::Ordering;

use clap::Parser;
use futures::StreamExt;
use log::Level;
use tsuzuri::error::Error;
use tsuzuri::{ArchiveCompression, BatchReport, ConverterConfig};

/// Progress lines already reach the terminal through the log stream, so the
/// crate's own `log` records stay off unless RUST_LOG asks for them.
const DEFAULT_LOG_FILTER: &str = "warn,tsuzuri=off";

#[derive(Parser, Debug)]
#[clap(about, author, version)]
pub struct Args {
    /// Directory containing one subfolder per title
    pub input: PathBuf,
    /// Directory receiving one converted folder per title
    pub output: PathBuf,
    /// Deflate archive entries instead of storing them
    #[clap(long, action)]
    pub deflate: bool,
    /// Fail instead of creating a missing output directory
    #[clap(long, action)]
    pub no_create_output: bool,
    /// Exit with status 2 when any title failed
    #[clap(long, action)]
    pub strict: bool,
    /// Only print warnings, errors and the final summary
    #[clap(short, long, action)]
    pub quiet: bool,
}

fn print_summary(report: &BatchReport) {
    println!(
        "{} of {} directories processed, {} CBZ file(s) created, {} cover(s) copied.",
        report.units.len(),
        report.total_units,
        report.archives_created(),
        report.covers_copied()
    );

    let warnings = report.warning_count();
    if warnings > 0 {
        eprintln!("Completed with {} warning(s):", warnings);
        for unit in report.failed_units() {
            eprintln!(
                "  {}: {}",
                unit.folder_name,
                unit.error.as_deref().unwrap_or("unknown error")
            );
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(DEFAULT_LOG_FILTER))
        .init();

    let args = Args::parse();

    let config = match ConverterConfig::builder()
        .input_root(args.input.clone())
        .output_root(args.output.clone())
        .create_output_root(!args.no_create_output)
        .compression(if args.deflate {
            ArchiveCompression::Deflated
        } else {
            ArchiveCompression::Stored
        })
        .build()
    {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(1);
        }
    };

    if !args.quiet {
        println!("Starting processing...");
    }

    let (handle, mut lines) = config.spawn();

    let cancel = handle.cancel_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("Interrupt received, stopping after the current title...");
            cancel.store(true, Ordering::SeqCst);
        }
    });

    while let Some(line) = lines.next().await {
        match line.level {
            Level::Error | Level::Warn => eprintln!("{}", line),
            _ if args.quiet => {}
            _ => println!("{}", line),
        }
    }

    let report = match handle.wait().await {
        Ok(report) => report,
        // Fatal batch errors have already been printed from the log stream.
        Err(Error::Join(e)) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(1);
        }
        Err(_) => return ExitCode::from(1),
    };

    print_summary(&report);

    if report.cancelled {
        ExitCode::from(130)
    } else if args.strict && report.warning_count() > 0 {
        ExitCode::from(2)
    } else {
        ExitCode::SUCCESS
    }
}
