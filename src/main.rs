use audio_batch_convert::{ConversionOptions, convert_folder};
use clap::Parser;
use log::{error, info};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// source directory containing audio files
    source: PathBuf,

    /// target directory for converted files
    target: PathBuf,

    /// sample rate in Hz
    #[arg(short = 'r', long, default_value_t = 44100)]
    sample_rate: u32,

    /// bit depth in bits
    #[arg(short, long, default_value_t = 16)]
    bit_depth: u16,

    /// number of threads to use, default to CPU core count
    #[arg(short, long)]
    threads: Option<usize>,

    /// global timeout in seconds; no new conversions start once elapsed
    #[arg(long)]
    timeout: Option<u64>,
}

fn main() -> ExitCode {
    _ = pretty_env_logger::formatted_builder()
        .filter_level(log::LevelFilter::Info)
        .format_timestamp_secs()
        .parse_default_env()
        .try_init();

    let cli = Cli::parse();

    let options = ConversionOptions {
        source_dir: cli.source,
        target_dir: cli.target,
        sample_rate: cli.sample_rate,
        bit_depth: cli.bit_depth,
        num_threads: cli.threads,
        timeout: cli.timeout.map(Duration::from_secs),
    };

    info!("Starting batch conversion with options:");
    info!("  Source Directory: {:?}", options.source_dir);
    info!("  Target Directory: {:?}", options.target_dir);
    info!("  Sample Rate: {} Hz", options.sample_rate);
    info!("  Bit Depth: {} bit", options.bit_depth);
    if let Some(n) = options.num_threads {
        info!("  Threads: {}", n);
    } else {
        info!("  Threads: Default");
    }
    if let Some(t) = options.timeout {
        info!("  Timeout: {}s", t.as_secs());
    }
    info!("---");

    match convert_folder(&options) {
        Ok(summary) if summary.all_succeeded() => {
            info!("Conversion finished successfully!");
            ExitCode::SUCCESS
        }
        Ok(summary) => {
            error!(
                "{} of {} files failed to convert.",
                summary.failures.len(),
                summary.total
            );
            ExitCode::from(1)
        }
        Err(e) => {
            error!("Conversion failed: {}", e);
            ExitCode::from(2)
        }
    }
}
