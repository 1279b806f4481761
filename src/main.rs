//! bridge-ingest: read legacy bridge deal files into canonical records
//!
//! Prints every record as `label: value` lines, or converts records to
//! another dialect with `--emit`.

use anyhow::{Context, Result};
use bridge_ingest::batch::{run_batch, FileReport};
use bridge_ingest::Format;
use clap::Parser;
use log::{debug, error, info};
use std::io::Write;
use std::path::PathBuf;

/// Bridge deal ingestion
///
/// Parses LIN, PBN, RBN/RBX and canvas diagram files (TXT, EML, REC).
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Args {
    /// Input files
    #[arg(required = true, value_name = "FILE")]
    files: Vec<PathBuf>,

    /// Input dialect (default: taken from each file's extension)
    #[arg(short, long, value_name = "FORMAT")]
    format: Option<Format>,

    /// Write records in this dialect instead of listing labels
    #[arg(long, value_name = "FORMAT")]
    emit: Option<Format>,

    /// Directory holding `<file>.fix` overlays (default: next to each input)
    #[arg(long = "fix-dir", value_name = "DIR")]
    fix_dir: Option<PathBuf>,

    /// Enable verbose logging (use -vv for trace output)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Number of worker threads
    #[arg(short = 'j', long, default_value_t = 1, value_name = "N")]
    threads: usize,
}

fn print_report(out: &mut impl Write, report: &FileReport, emit: Option<Format>) -> Result<()> {
    for chunk in &report.chunks {
        match emit {
            Some(format) => {
                write!(out, "{}", format.write_record(&chunk.record))?;
                writeln!(out)?;
            }
            None => {
                if chunk.new_group {
                    writeln!(out, "== {} ==", report.path.display())?;
                }
                for (label, value, line) in chunk.record.iter() {
                    writeln!(out, "{}:{}: {}: {}", report.path.display(), line, label, value)?;
                }
                writeln!(out)?;
            }
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = match args.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp_millis()
        .init();

    info!("bridge-ingest v{}", env!("CARGO_PKG_VERSION"));
    debug!("Files: {:?}", args.files);
    debug!("Format: {:?}", args.format);
    debug!("Emit: {:?}", args.emit);
    debug!("Threads: {}", args.threads);

    if let Some(dir) = &args.fix_dir {
        if !dir.is_dir() {
            anyhow::bail!("Fix directory not found: {:?}", dir);
        }
    }

    let reports = run_batch(&args.files, args.format, args.fix_dir.as_deref(), args.threads);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut failed = 0;
    for report in &reports {
        print_report(&mut out, report, args.emit)
            .with_context(|| format!("Failed to write records of {:?}", report.path))?;
        if !report.is_ok() {
            failed += 1;
        }
    }

    let chunks: usize = reports.iter().map(|r| r.chunks.len()).sum();
    info!("Processed {} files, {} records", reports.len(), chunks);
    if failed > 0 {
        error!("{} files could not be fully read", failed);
    }

    Ok(())
}
