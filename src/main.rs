mod config;
mod error;
mod output;
mod pipeline;
mod timestamp;
mod transformer;

use anyhow::{Result, anyhow};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::ConvertOptions;
use crate::pipeline::ConversionSummary;

/// Reformat a Torque Pro CSV log so analytics tools can chart it.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Torque Pro CSV log to read
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,

    /// CSV file to write
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Drop every row whose position is a multiple of this (> 1 to take effect)
    #[arg(value_name = "STRIDE", allow_negative_numbers = true)]
    stride: Option<i64>,

    /// Any non-empty value (even "False") keeps only the time; "" retains the date
    #[arg(value_name = "DISCARD_DATE")]
    discard_date: Option<String>,

    #[arg(long)]
    benchmark: bool,
}

impl Args {
    /// Input, output and options, or `None` when fewer than two paths were given.
    fn job(&self) -> Option<(&Path, &Path, ConvertOptions)> {
        let input = self.input.as_deref()?;
        let output = self.output.as_deref()?;
        let options = ConvertOptions::from_args(self.stride, self.discard_date.as_deref());
        Some((input, output, options))
    }
}

const USAGE: &str = "\
Provide an input file name to parse as the first argument,
an output file name as the second argument,
optionally an integer 'to skip every nth' as a third,
and optionally a flag for the date column as a fourth.

For example as a bare minimum, input.csv must exist already:
re-date ./input.csv ./output.csv
 - or -
re-date ./input.csv ./output.csv 3 \"\"
 - the above example will remove about 33% of the data, meanwhile retaining
   the date and time in the datetime column.
re-date ./input.csv ./output.csv 2
 - the above example will remove about 50% of the data, meanwhile retaining
   only the time in the datetime column.

The integer provided must be greater than 1.
Note: any non-empty fourth argument, including the word False, still discards
the date; only an empty string retains it.";

fn main() -> Result<()> {
    init_logging()?;
    let args = Args::parse();

    let Some((input, output, options)) = args.job() else {
        println!("{USAGE}");
        return Ok(());
    };

    // failures are printed by process_log; exit status stays 0 either way
    if let Some(summary) = pipeline::process_log(input, output, options) {
        if args.benchmark {
            print_benchmark_results(&summary);
        }
    }

    Ok(())
}

fn init_logging() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow!("failed to initialise logging: {e}"))
}

fn print_benchmark_results(summary: &ConversionSummary) {
    let duration_secs = summary.elapsed.as_secs_f64().max(f64::EPSILON);
    let file_size_mb = summary.bytes_read as f64 / (1024.0 * 1024.0);
    let kept = if summary.rows_read == 0 {
        100.0
    } else {
        (summary.rows_written as f64 / summary.rows_read as f64) * 100.0
    };

    eprintln!("\n=== BENCHMARK RESULTS ===");
    eprintln!("File size: {:.2} MB", file_size_mb);
    eprintln!("Rows read: {}", summary.rows_read);
    eprintln!("Rows written: {}", summary.rows_written);
    eprintln!("Processing time: {:.3}s", duration_secs);
    eprintln!("Throughput: {:.2} MB/s", file_size_mb / duration_secs);
    eprintln!("Throughput: {:.0} rows/s", summary.rows_read as f64 / duration_secs);
    eprintln!("Rows kept: {:.1}%", kept);
}
