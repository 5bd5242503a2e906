use crate::schedule::{RunSummary, TaskOutcome};
use crossbeam_channel::Receiver;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::thread::JoinHandle;

/// Immutable events emitted by scheduler workers. Sent over an unbounded
/// channel so a slow terminal can never stall a worker.
#[derive(Debug)]
pub enum ProgressEvent {
    TaskStarted { path: PathBuf },
    TaskFinished { path: PathBuf, outcome: TaskOutcome },
    RunComplete { summary: RunSummary },
}

/// Single consumer of progress events, rendering an overall bar plus one line
/// per finished file on its own thread.
pub struct ProgressReporter {
    handle: JoinHandle<()>,
}

impl ProgressReporter {
    /// The total must be known up front; the bar position only ever advances.
    pub fn spawn(total: u64, events: Receiver<ProgressEvent>) -> Self {
        let handle = std::thread::spawn(move || render_events(total, events));
        ProgressReporter { handle }
    }

    /// Waits until the reporter has drained its channel and finished drawing.
    pub fn join(self) {
        let _ = self.handle.join();
    }
}

fn render_events(total: u64, events: Receiver<ProgressEvent>) {
    let pb = ProgressBar::new(total);
    pb.set_style(ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}").expect("Internal Error: Failed to set progress bar style")
        .progress_chars("#>-"));
    pb.set_message("Converting files");

    for event in events {
        match event {
            ProgressEvent::TaskStarted { path } => {
                let name = path.file_name().unwrap_or_default().to_string_lossy().to_string();
                pb.set_message(format!("Converting {name}"));
            }
            ProgressEvent::TaskFinished { path, outcome } => {
                // println keeps per-file lines above the bar instead of
                // tearing it
                match outcome {
                    TaskOutcome::Succeeded => pb.println(format!("✓ {}", path.display())),
                    TaskOutcome::Failed(reason) => {
                        pb.println(format!("✗ {}: {}", path.display(), reason))
                    }
                }
                pb.inc(1);
            }
            ProgressEvent::RunComplete { summary } => {
                pb.finish_with_message(format!(
                    "{} succeeded, {} failed",
                    summary.succeeded,
                    summary.failures.len()
                ));
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reporter_drains_and_joins() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let reporter = ProgressReporter::spawn(2, rx);

        tx.send(ProgressEvent::TaskStarted {
            path: PathBuf::from("a.wav"),
        })
        .unwrap();
        tx.send(ProgressEvent::TaskFinished {
            path: PathBuf::from("a.wav"),
            outcome: TaskOutcome::Succeeded,
        })
        .unwrap();
        tx.send(ProgressEvent::TaskFinished {
            path: PathBuf::from("b.wav"),
            outcome: TaskOutcome::Failed("boom".to_string()),
        })
        .unwrap();
        tx.send(ProgressEvent::RunComplete {
            summary: RunSummary {
                total: 2,
                succeeded: 1,
                failures: vec![(PathBuf::from("b.wav"), "boom".to_string())],
            },
        })
        .unwrap();

        // RunComplete terminates the reporter even with the sender still open
        reporter.join();
    }

    #[test]
    fn test_reporter_stops_when_senders_drop() {
        let (tx, rx) = crossbeam_channel::unbounded::<ProgressEvent>();
        let reporter = ProgressReporter::spawn(0, rx);
        drop(tx);
        reporter.join();
    }
}
