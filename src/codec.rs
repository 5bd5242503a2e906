//! External ffmpeg/ffprobe collaborator.
//!
//! The actual decoding, resampling and encoding is delegated to subprocesses;
//! this module only builds the invocations and maps their results. Both
//! capabilities sit behind traits so the scheduler can be tested with scripted
//! fakes instead of a real ffmpeg install.

use crate::error::{ConversionError, ProbeError};
use crate::scan::{AudioFormat, ConversionTask};
use log::debug;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::process::{Command, Stdio};

/// Raw-sample access to a source file, used for channel-identity probing.
pub trait SampleProber: Sync {
    /// Number of channels in the first audio stream.
    fn channel_count(&self, path: &Path) -> Result<u32, ProbeError>;

    /// The full decoded sample stream as raw interleaved signed PCM,
    /// at the source's native rate, without re-encoding.
    fn raw_samples(&self, path: &Path) -> Result<Vec<i32>, ProbeError>;
}

/// Final encode step for one task.
pub trait Encoder: Sync {
    /// Writes the destination file with the task's sample rate and bit depth,
    /// forcing the given output channel count. Overwrites any existing file.
    fn encode(&self, task: &ConversionTask, channels: u32) -> Result<(), ConversionError>;
}

#[derive(Debug, Clone)]
pub struct FfmpegCodec {
    pub ffmpeg_path: String,
    pub ffprobe_path: String,
}

impl Default for FfmpegCodec {
    fn default() -> Self {
        FfmpegCodec {
            ffmpeg_path: "ffmpeg".to_string(),
            ffprobe_path: "ffprobe".to_string(),
        }
    }
}

impl FfmpegCodec {
    /// PCM codec name for the requested bit depth, with the byte order the
    /// destination container expects. Unknown depths were rejected during
    /// option validation; fall back to 32-bit rather than panic.
    fn pcm_codec(bit_depth: u16, format: AudioFormat) -> &'static str {
        match (format, bit_depth) {
            (AudioFormat::Wav, 16) => "pcm_s16le",
            (AudioFormat::Wav, 24) => "pcm_s24le",
            (AudioFormat::Wav, _) => "pcm_s32le",
            (AudioFormat::Aiff, 16) => "pcm_s16be",
            (AudioFormat::Aiff, 24) => "pcm_s24be",
            (AudioFormat::Aiff, _) => "pcm_s32be",
        }
    }

    /// Option arguments between input and output. The paths themselves are
    /// passed to the child as `OsStr` so non-UTF-8 names stay byte-exact.
    fn encode_args(task: &ConversionTask, channels: u32) -> Vec<String> {
        let format = AudioFormat::from_path(&task.dest).unwrap_or(AudioFormat::Wav);
        vec![
            "-acodec".to_string(),
            Self::pcm_codec(task.bit_depth, format).to_string(),
            "-ar".to_string(),
            task.sample_rate.to_string(),
            "-ac".to_string(),
            channels.to_string(),
        ]
    }
}

/// Parses ffprobe JSON output into a channel count.
fn parse_channel_count(output: &str) -> Result<u32, ProbeError> {
    #[derive(Deserialize)]
    struct ProbeOutput {
        #[serde(default)]
        streams: Vec<ProbeStream>,
    }

    #[derive(Deserialize)]
    struct ProbeStream {
        channels: Option<u32>,
    }

    let probe: ProbeOutput =
        serde_json::from_str(output).map_err(|e| ProbeError::Parse(e.to_string()))?;
    probe
        .streams
        .iter()
        .find_map(|s| s.channels)
        .ok_or(ProbeError::NoAudioStream)
}

impl SampleProber for FfmpegCodec {
    fn channel_count(&self, path: &Path) -> Result<u32, ProbeError> {
        let output = Command::new(&self.ffprobe_path)
            .args([
                "-v",
                "quiet",
                "-select_streams",
                "a:0",
                "-show_entries",
                "stream=channels",
                "-print_format",
                "json",
            ])
            .arg(path)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| ProbeError::Spawn {
                tool: "ffprobe",
                source,
            })?;

        if !output.status.success() {
            return Err(ProbeError::ToolFailed {
                tool: "ffprobe",
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        parse_channel_count(&String::from_utf8_lossy(&output.stdout))
    }

    fn raw_samples(&self, path: &Path) -> Result<Vec<i32>, ProbeError> {
        let output = Command::new(&self.ffmpeg_path)
            .args(["-v", "error", "-i"])
            .arg(path)
            .args(["-map", "0:a:0", "-f", "s32le", "-acodec", "pcm_s32le", "-"])
            .stdin(Stdio::null())
            .output()
            .map_err(|source| ProbeError::Spawn {
                tool: "ffmpeg",
                source,
            })?;

        if !output.status.success() {
            return Err(ProbeError::ToolFailed {
                tool: "ffmpeg",
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let mut samples = Vec::with_capacity(output.stdout.len() / 4);
        for chunk in output.stdout.chunks_exact(4) {
            samples.push(i32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
        }
        debug!("Decoded {} raw samples from {:?}", samples.len(), path);
        Ok(samples)
    }
}

impl Encoder for FfmpegCodec {
    fn encode(&self, task: &ConversionTask, channels: u32) -> Result<(), ConversionError> {
        let args = Self::encode_args(task, channels);
        debug!(
            "Running {} -y -i {:?} {} {:?}",
            self.ffmpeg_path,
            task.source,
            args.join(" "),
            task.dest
        );
        let output = Command::new(&self.ffmpeg_path)
            .args(["-y", "-v", "error", "-i"]) // -y overwrites existing output
            .arg(&task.source)
            .args(&args)
            .arg(&task.dest)
            .stdin(Stdio::null())
            .output()
            .map_err(ConversionError::Spawn)?;

        if !output.status.success() {
            return Err(ConversionError::ExitStatus {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        // A failed run can still leave a truncated file behind; catch the
        // detectable case where nothing was written at all.
        match fs::metadata(&task.dest) {
            Ok(meta) if meta.len() > 0 => Ok(()),
            _ => Err(ConversionError::EmptyOutput),
        }
    }
}
