//! CLI tool to convert fixed-width data files to JSON using a layout file.
//!
//! Usage:
//!   cobol-to-json <layout.json> <input.data>
//!   cobol-to-json <layout.json> <input.data> -o <output.json> --on-error collect --errors <report.json>
//!
//! If no output file is specified, writes to stdout. Log output goes to
//! stderr and honours `RUST_LOG`.

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use copybook_rs::{ConvertError, DecodeOptions, OnError, RecordLayout, convert_reader, write_text};
use tracing_subscriber::EnvFilter;

/// Convert fixed-width records to a JSON array using a declarative layout.
#[derive(Parser)]
#[command(name = "cobol-to-json")]
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

    /// Emit compact JSON instead of indented
    #[arg(long)]
    compact: bool,

    /// Log paths, policy, and record counts
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

    tracing::info!(
        layout = %cli.layout.display(),
        input = %cli.input.display(),
        on_error = ?cli.on_error,
        "converting"
    );

    let input = File::open(&cli.input).map_err(|e| ConvertError::Io {
        path: Some(cli.input.clone()),
        source: e,
    })?;
    let options = DecodeOptions::new(cli.on_error);
    let conversion = convert_reader(&layout, BufReader::new(input), &options)?;

    let json = conversion.records_json(!cli.compact)?;
    write_text(cli.output.as_deref(), &json)?;

    conversion.report_errors(cli.errors.as_deref())?;

    let stats = conversion.stats;
    tracing::info!(
        records = stats.records,
        failed = stats.failed,
        output = %cli.output.as_ref().map_or("(stdout)".into(), |p| p.display().to_string()),
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
