//! CLI tool to convert fixed-width data files to JSON on several threads.

use std::fs;
use std::path::PathBuf;
use std::process;
use std::thread;

use clap::Parser;
use copybook_rs::{ConvertError, DecodeOptions, OnError, RecordLayout, write_text};
use par_decode::decode_parallel;
use tracing_subscriber::EnvFilter;

/// Convert fixed-width records to JSON using parallel workers.
///
/// Produces identical output to cobol-to-json for every error policy.
#[derive(Parser)]
#[command(name = "cobol-to-json-par")]
struct Cli {
    /// Layout description file (.json)
    layout: PathBuf,

    /// Input data file (fixed-width records, or /dev/stdin)
    input: PathBuf,

    /// Write JSON to file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// What to do with a line that fails to decode
    #[arg(long, value_enum, default_value_t = OnError::Abort)]
    on_error: OnError,

    /// Write collected line errors to this file (with --on-error collect)
    #[arg(long)]
    errors: Option<PathBuf>,

    /// Number of worker threads (default: available parallelism)
    #[arg(short, long)]
    workers: Option<usize>,

    /// Emit compact JSON instead of indented
    #[arg(long)]
    compact: bool,

    /// Log paths, worker count, and record counts
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(&cli) {
        eprintln!("Conversion error: {e}");
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), ConvertError> {
    if cli.errors.is_some() && cli.on_error != OnError::Collect {
        tracing::warn!(
            on_error = ?cli.on_error,
            "--errors has no effect unless --on-error collect is set"
        );
    }

    let layout = RecordLayout::from_path(&cli.layout)?;
    let input = fs::read_to_string(&cli.input).map_err(|e| ConvertError::Io {
        path: Some(cli.input.clone()),
        source: e,
    })?;

    let workers = cli
        .workers
        .unwrap_or_else(|| thread::available_parallelism().map_or(1, |n| n.get()));
    tracing::info!(
        layout = %cli.layout.display(),
        input = %cli.input.display(),
        workers,
        "converting"
    );

    let options = DecodeOptions::new(cli.on_error);
    let conversion = decode_parallel(&layout, &input, &options, workers)?;

    write_text(cli.output.as_deref(), &conversion.records_json(!cli.compact)?)?;

    conversion.report_errors(cli.errors.as_deref())?;

    tracing::info!(
        records = conversion.stats.records,
        failed = conversion.stats.failed,
        "done"
    );
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
