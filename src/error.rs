use std::path::PathBuf;

/// Fatal startup errors. Anything that happens after planning is a per-file
/// error and becomes a `Failed` outcome instead of aborting the run.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Source root is not a valid directory: {0:?}")]
    InvalidRoot(PathBuf),
    #[error("Invalid options: {0}")]
    InvalidOptions(String),
}

#[derive(thiserror::Error, Debug)]
pub enum ProbeError {
    #[error("Failed to start {tool}: {source}")]
    Spawn {
        tool: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("{tool} exited with code {code:?}: {stderr}")]
    ToolFailed {
        tool: &'static str,
        code: Option<i32>,
        stderr: String,
    },
    #[error("Could not parse ffprobe output: {0}")]
    Parse(String),
    #[error("No audio stream found")]
    NoAudioStream,
}

#[derive(thiserror::Error, Debug)]
pub enum ConversionError {
    #[error("Failed to start ffmpeg: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("ffmpeg exited with code {code:?}: {stderr}")]
    ExitStatus { code: Option<i32>, stderr: String },
    #[error("Output file is missing or empty after encoding")]
    EmptyOutput,
}

/// Everything that can fail one task. Caught at the task boundary and turned
/// into a `TaskOutcome::Failed`; never propagated to sibling tasks.
#[derive(thiserror::Error, Debug)]
pub enum TaskError {
    #[error("Channel probe failed: {0}")]
    Probe(#[from] ProbeError),
    #[error("Conversion failed: {0}")]
    Convert(#[from] ConversionError),
    #[error("Could not create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Cancelled before start")]
    Cancelled,
}
