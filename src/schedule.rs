use crate::codec::{Encoder, SampleProber};
use crate::error::TaskError;
use crate::probe::probe_verdict;
use crate::progress::ProgressEvent;
use crate::scan::ConversionTask;
use crossbeam_channel::Sender;
use log::{debug, warn};
use rayon::prelude::*;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

/// Terminal state of one task, produced exactly once
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Succeeded,
    Failed(String),
}

/// Aggregate of all task outcomes for one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failures: Vec<(PathBuf, String)>,
}

impl RunSummary {
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Runs every task on the rayon worker pool, producing one outcome per task
/// in submission order. One file's failure never aborts or skips any other
/// file.
///
/// Each worker probes and converts its task sequentially; the only shared
/// state is the event sender and the collected outcome vector. Once the
/// cancel flag is set or the deadline has passed, no new task starts;
/// in-flight conversions are allowed to finish (the external process is not
/// killed).
pub fn run_tasks(
    tasks: &[ConversionTask],
    prober: &impl SampleProber,
    encoder: &impl Encoder,
    events: &Sender<ProgressEvent>,
    cancel: &AtomicBool,
    deadline: Option<Instant>,
) -> Vec<TaskOutcome> {
    tasks
        .par_iter()
        .map(|task| {
            if cancel.load(Ordering::SeqCst) || deadline.is_some_and(|d| Instant::now() >= d) {
                debug!("Skipping {:?}: cancellation observed", task.source);
                let outcome = TaskOutcome::Failed(TaskError::Cancelled.to_string());
                let _ = events.send(ProgressEvent::TaskFinished {
                    path: task.source.clone(),
                    outcome: outcome.clone(),
                });
                return outcome;
            }

            let _ = events.send(ProgressEvent::TaskStarted {
                path: task.source.clone(),
            });
            let outcome = match execute_task(task, prober, encoder) {
                Ok(()) => TaskOutcome::Succeeded,
                Err(e) => {
                    warn!("Conversion of {:?} failed: {}", task.source, e);
                    TaskOutcome::Failed(e.to_string())
                }
            };
            let _ = events.send(ProgressEvent::TaskFinished {
                path: task.source.clone(),
                outcome: outcome.clone(),
            });
            outcome
        })
        .collect()
}

/// One file end to end: probe, ensure destination ancestors, encode.
/// On failure a partially written destination file is left in place.
fn execute_task(
    task: &ConversionTask,
    prober: &impl SampleProber,
    encoder: &impl Encoder,
) -> Result<(), TaskError> {
    let (verdict, source_channels) = probe_verdict(prober, &task.source)?;
    let channels = verdict.output_channels(source_channels);

    if let Some(parent) = task.dest.parent() {
        // create_dir_all is idempotent, so concurrent creation of a shared
        // ancestor by two tasks is fine
        fs::create_dir_all(parent).map_err(|source| TaskError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    encoder.encode(task, channels)?;
    debug!("Wrote {:?} with {} channel(s)", task.dest, channels);
    Ok(())
}

/// Pairs outcomes back with their tasks. Outcomes are collected in
/// submission order, so the zip is positional.
pub fn summarize(tasks: &[ConversionTask], outcomes: &[TaskOutcome]) -> RunSummary {
    let mut summary = RunSummary {
        total: tasks.len(),
        ..Default::default()
    };
    for (task, outcome) in tasks.iter().zip(outcomes) {
        match outcome {
            TaskOutcome::Succeeded => summary.succeeded += 1,
            TaskOutcome::Failed(reason) => summary
                .failures
                .push((task.source.clone(), reason.clone())),
        }
    }
    summary
}
