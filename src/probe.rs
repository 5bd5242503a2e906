use crate::codec::SampleProber;
use crate::error::ProbeError;
use log::debug;
use std::path::Path;
use strum_macros::Display;

/// Result of inspecting a source file's channel layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ChannelVerdict {
    /// Source already has a single channel
    MonoSource,
    /// Stereo with bit-identical left and right channels
    StereoIdentical,
    /// Stereo with at least one differing sample pair, or a multichannel
    /// source that is passed through without a mono-collapse decision
    StereoDistinct,
}

impl ChannelVerdict {
    /// Output channel count this verdict forces, given the source's count.
    /// Distinct sources keep their layout unchanged.
    pub fn output_channels(self, source_channels: u32) -> u32 {
        match self {
            ChannelVerdict::MonoSource | ChannelVerdict::StereoIdentical => 1,
            ChannelVerdict::StereoDistinct => source_channels,
        }
    }
}

/// Decides whether a source file's channels are redundant. Returns the verdict
/// together with the source channel count.
///
/// A decode failure fails the whole task for this file; there is no fallback
/// to treating it as ordinary stereo.
pub fn probe_verdict(
    prober: &impl SampleProber,
    path: &Path,
) -> Result<(ChannelVerdict, u32), ProbeError> {
    let channels = prober.channel_count(path)?;
    let verdict = match channels {
        1 => ChannelVerdict::MonoSource,
        2 => {
            let samples = prober.raw_samples(path)?;
            if stereo_channels_identical(&samples) {
                ChannelVerdict::StereoIdentical
            } else {
                ChannelVerdict::StereoDistinct
            }
        }
        // No mono-collapse decision applies to surround layouts
        _ => ChannelVerdict::StereoDistinct,
    };
    debug!("{:?}: {} channel(s), verdict {}", path, channels, verdict);
    Ok((verdict, channels))
}

/// Exact positional equality of the two channels of an interleaved stereo
/// stream. A trailing unpaired sample is a length mismatch, hence distinct.
/// This is deliberately not a tolerance comparison; partial correlation is
/// not identity.
fn stereo_channels_identical(interleaved: &[i32]) -> bool {
    if interleaved.len() % 2 != 0 {
        return false;
    }
    interleaved.chunks_exact(2).all(|frame| frame[0] == frame[1])
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeProber {
        channels: u32,
        samples: Vec<i32>,
    }

    impl SampleProber for FakeProber {
        fn channel_count(&self, _path: &Path) -> Result<u32, ProbeError> {
            Ok(self.channels)
        }

        fn raw_samples(&self, _path: &Path) -> Result<Vec<i32>, ProbeError> {
            Ok(self.samples.clone())
        }
    }

    struct BrokenProber;

    impl SampleProber for BrokenProber {
        fn channel_count(&self, _path: &Path) -> Result<u32, ProbeError> {
            Err(ProbeError::NoAudioStream)
        }

        fn raw_samples(&self, _path: &Path) -> Result<Vec<i32>, ProbeError> {
            Err(ProbeError::NoAudioStream)
        }
    }

    fn verdict_for(channels: u32, samples: Vec<i32>) -> ChannelVerdict {
        let prober = FakeProber { channels, samples };
        probe_verdict(&prober, Path::new("x.wav")).unwrap().0
    }

    #[test]
    fn test_mono_source() {
        assert_eq!(verdict_for(1, vec![1, 2, 3]), ChannelVerdict::MonoSource);
    }

    #[test]
    fn test_identical_stereo_collapses() {
        // L=[1,2], R=[1,2] interleaved
        assert_eq!(
            verdict_for(2, vec![1, 1, 2, 2]),
            ChannelVerdict::StereoIdentical
        );
    }

    #[test]
    fn test_single_differing_pair_is_distinct() {
        assert_eq!(
            verdict_for(2, vec![1, 1, 2, 3]),
            ChannelVerdict::StereoDistinct
        );
    }

    #[test]
    fn test_true_stereo_is_distinct() {
        // L=[1,2], R=[3,4]
        assert_eq!(
            verdict_for(2, vec![1, 3, 2, 4]),
            ChannelVerdict::StereoDistinct
        );
    }

    #[test]
    fn test_length_mismatch_is_distinct() {
        assert_eq!(
            verdict_for(2, vec![1, 1, 2]),
            ChannelVerdict::StereoDistinct
        );
    }

    #[test]
    fn test_multichannel_passes_through() {
        let prober = FakeProber {
            channels: 6,
            samples: vec![],
        };
        let (verdict, channels) = probe_verdict(&prober, Path::new("x.wav")).unwrap();
        assert_eq!(verdict, ChannelVerdict::StereoDistinct);
        assert_eq!(verdict.output_channels(channels), 6);
    }

    #[test]
    fn test_output_channels() {
        assert_eq!(ChannelVerdict::MonoSource.output_channels(1), 1);
        assert_eq!(ChannelVerdict::StereoIdentical.output_channels(2), 1);
        assert_eq!(ChannelVerdict::StereoDistinct.output_channels(2), 2);
    }

    #[test]
    fn test_probe_failure_propagates() {
        assert!(probe_verdict(&BrokenProber, Path::new("x.wav")).is_err());
    }
}
