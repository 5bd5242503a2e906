//! Batch audio tree conversion: mirrors a source directory of WAV/AIFF files
//! into a target directory at a configured sample rate and bit depth,
//! collapsing stereo files with bit-identical channels to mono. Decoding and
//! encoding are delegated to external ffmpeg/ffprobe processes.

/// Module for the external ffmpeg/ffprobe collaborator
pub mod codec;
/// Module for error handling
pub mod error;
/// Module for channel-identity probing
pub mod probe;
/// Module for progress reporting
pub mod progress;
/// Module for source-tree scanning and planning
pub mod scan;
/// Module for the concurrent task scheduler
pub mod schedule;

use crate::codec::{Encoder, FfmpegCodec, SampleProber};
use crate::error::Error;
use crate::progress::{ProgressEvent, ProgressReporter};
use crate::schedule::RunSummary;
use log::{error, info, warn};
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::time::{Duration, Instant};

pub use crate::probe::ChannelVerdict;
pub use crate::scan::{AudioFormat, ConversionTask};
pub use crate::schedule::TaskOutcome;

/// Configuration for one conversion run
#[derive(Debug, Clone)]
pub struct ConversionOptions {
    /// Source directory containing audio files to convert
    pub source_dir: PathBuf,
    /// Target directory mirroring the source tree
    pub target_dir: PathBuf,
    /// Output sample rate in Hz
    pub sample_rate: u32,
    /// Output bit depth in bits (16, 24 or 32)
    pub bit_depth: u16,
    /// Number of threads for parallel processing
    pub num_threads: Option<usize>,
    /// Global timeout; no new conversions start once elapsed
    pub timeout: Option<Duration>,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        ConversionOptions {
            source_dir: PathBuf::from("."),
            target_dir: PathBuf::from("converted"),
            sample_rate: 44100,
            bit_depth: 16,
            num_threads: None,
            timeout: None,
        }
    }
}

/// Converts a whole folder using the real ffmpeg/ffprobe tools.
///
/// Returns the run summary; per-file failures are inside it, only startup
/// problems (invalid source root, invalid options) are an `Err`.
pub fn convert_folder(options: &ConversionOptions) -> Result<RunSummary, Error> {
    let codec = FfmpegCodec::default();
    let cancel = AtomicBool::new(false);
    convert_folder_with(options, &codec, &codec, &cancel)
}

/// Full pipeline with injectable collaborators: scan and plan, then fan the
/// tasks out over the worker pool while a reporter thread renders progress,
/// then summarize.
///
/// Planning completes before any conversion starts since the total count is
/// needed for progress rendering. Setting `cancel` stops new tasks from
/// starting; in-flight conversions finish.
pub fn convert_folder_with(
    options: &ConversionOptions,
    prober: &impl SampleProber,
    encoder: &impl Encoder,
    cancel: &AtomicBool,
) -> Result<RunSummary, Error> {
    validate_options(options)?;
    configure_thread_pool(options.num_threads);

    info!("Discovering audio files in {:?}...", options.source_dir);
    let tasks = scan::plan_tasks(
        &options.source_dir,
        &options.target_dir,
        options.sample_rate,
        options.bit_depth,
    )?;
    if tasks.is_empty() {
        info!("No audio files found.");
        return Ok(RunSummary::default());
    }
    info!("Found {} audio files.", tasks.len());

    let (events_tx, events_rx) = crossbeam_channel::unbounded();
    let reporter = ProgressReporter::spawn(tasks.len() as u64, events_rx);
    let deadline = options.timeout.map(|t| Instant::now() + t);

    let outcomes = schedule::run_tasks(&tasks, prober, encoder, &events_tx, cancel, deadline);
    let summary = schedule::summarize(&tasks, &outcomes);

    let _ = events_tx.send(ProgressEvent::RunComplete {
        summary: summary.clone(),
    });
    drop(events_tx);
    reporter.join();

    for (path, reason) in &summary.failures {
        error!("Failed: {:?}: {}", path, reason);
    }
    info!(
        "Conversion complete. {} files succeeded, {} files failed.",
        summary.succeeded,
        summary.failures.len()
    );
    Ok(summary)
}

fn validate_options(options: &ConversionOptions) -> Result<(), Error> {
    if options.sample_rate == 0 {
        return Err(Error::InvalidOptions(
            "Sample rate must be non-zero".to_string(),
        ));
    }
    if !matches!(options.bit_depth, 16 | 24 | 32) {
        return Err(Error::InvalidOptions(format!(
            "Unsupported bit depth: {} (expected 16, 24 or 32)",
            options.bit_depth
        )));
    }
    Ok(())
}

/// Configure the Rayon thread pool size if specified
fn configure_thread_pool(num_threads: Option<usize>) {
    match num_threads {
        Some(n) if n > 0 => {
            let rayon_init_result = rayon::ThreadPoolBuilder::new().num_threads(n).build_global();
            if let Err(e) = rayon_init_result {
                warn!(
                    "Failed to configure Rayon thread pool: {}. Using default number of threads.",
                    e
                );
            } else {
                info!("Using {} threads for processing.", n);
            }
        }
        _ => info!("Using default number of threads."),
    }
}
