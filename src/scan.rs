use crate::error::Error;
use log::debug;
use std::path::{Path, PathBuf};
use strum_macros::Display;
use walkdir::WalkDir;

/// Supported audio container formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "camelCase")]
pub enum AudioFormat {
    Wav,
    Aiff,
}

impl AudioFormat {
    /// Returns the list of accepted file extensions
    #[inline]
    pub fn supported_extensions() -> &'static [&'static str] {
        &["wav", "aiff", "aif"]
    }

    /// Creates an AudioFormat from a file path based on its extension
    #[inline]
    pub fn from_path(value: impl AsRef<Path>) -> Option<Self> {
        Some(
            match value
                .as_ref()
                .extension()
                .unwrap_or_default()
                .to_string_lossy()
                .to_lowercase()
                .as_ref()
            {
                "wav" => Self::Wav,
                "aiff" | "aif" => Self::Aiff,
                _ => return None,
            },
        )
    }
}

/// One unit of work: a single source file and the destination it mirrors to.
/// Created once during planning and immutable afterwards; the detected channel
/// mode is resolved on the worker that executes the task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionTask {
    pub source: PathBuf,
    pub dest: PathBuf,
    pub sample_rate: u32,
    pub bit_depth: u16,
}

/// Walks the source tree and builds the full work list, mirroring each file's
/// relative location into the target tree. The extension is preserved, so the
/// target tree has exactly the source tree's shape restricted to audio files.
///
/// Symlinks and non-regular files are skipped silently. The target root is not
/// validated here, it may not exist yet.
pub fn plan_tasks(
    source_root: impl AsRef<Path>,
    target_root: impl AsRef<Path>,
    sample_rate: u32,
    bit_depth: u16,
) -> Result<Vec<ConversionTask>, Error> {
    let source_root = source_root.as_ref();
    let target_root = target_root.as_ref();
    if !source_root.is_dir() {
        return Err(Error::InvalidRoot(source_root.to_path_buf()));
    }

    let mut tasks = Vec::new();
    for entry in WalkDir::new(source_root)
        .into_iter()
        .filter_map(|e| e.ok()) // Filter out directory reading errors
        .filter(|e| e.file_type().is_file())
    {
        let path = entry.path();
        if AudioFormat::from_path(path).is_none() {
            continue;
        }
        let Some(relative) = pathdiff::diff_paths(path, source_root) else {
            debug!("Skipping {:?}: not below source root", path);
            continue;
        };
        tasks.push(ConversionTask {
            source: path.to_path_buf(),
            dest: target_root.join(relative),
            sample_rate,
            bit_depth,
        });
    }

    // Stable planning order, so progress rendering is reproducible across runs
    tasks.sort_by(|a, b| a.source.cmp(&b.source));
    Ok(tasks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"riff").unwrap();
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(AudioFormat::from_path("a/b.wav"), Some(AudioFormat::Wav));
        assert_eq!(AudioFormat::from_path("a/b.WAV"), Some(AudioFormat::Wav));
        assert_eq!(AudioFormat::from_path("a/b.aiff"), Some(AudioFormat::Aiff));
        assert_eq!(AudioFormat::from_path("a/b.aif"), Some(AudioFormat::Aiff));
        assert_eq!(AudioFormat::from_path("a/b.mp3"), None);
        assert_eq!(AudioFormat::from_path("a/noext"), None);
    }

    #[test]
    fn test_plan_mirrors_relative_paths() {
        let src = tempfile::tempdir().unwrap();
        touch(&src.path().join("Album1/track1.wav"));
        touch(&src.path().join("Album2/Disc1/track3.aiff"));
        touch(&src.path().join("notes.txt"));
        touch(&src.path().join("cover.jpg"));

        let tasks = plan_tasks(src.path(), "/out", 48000, 24).unwrap();
        let dests: Vec<_> = tasks.iter().map(|t| t.dest.clone()).collect();
        assert_eq!(
            dests,
            vec![
                PathBuf::from("/out/Album1/track1.wav"),
                PathBuf::from("/out/Album2/Disc1/track3.aiff"),
            ]
        );
        assert!(tasks.iter().all(|t| t.sample_rate == 48000));
        assert!(tasks.iter().all(|t| t.bit_depth == 24));
    }

    #[test]
    fn test_plan_is_sorted_by_source() {
        let src = tempfile::tempdir().unwrap();
        touch(&src.path().join("b.wav"));
        touch(&src.path().join("a/z.wav"));
        touch(&src.path().join("a/a.wav"));

        let tasks = plan_tasks(src.path(), "/out", 44100, 16).unwrap();
        let sources: Vec<_> = tasks.iter().map(|t| t.source.clone()).collect();
        let mut sorted = sources.clone();
        sorted.sort();
        assert_eq!(sources, sorted);
        assert_eq!(tasks.len(), 3);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_files_are_skipped_silently() {
        let src = tempfile::tempdir().unwrap();
        let real = src.path().join("real.wav");
        touch(&real);
        std::os::unix::fs::symlink(&real, src.path().join("link.wav")).unwrap();

        let tasks = plan_tasks(src.path(), "/out", 44100, 16).unwrap();
        assert_eq!(tasks.len(), 1);
        assert!(tasks[0].source.ends_with("real.wav"));
    }

    #[test]
    fn test_plan_rejects_missing_root() {
        let err = plan_tasks("/does/not/exist", "/out", 44100, 16).unwrap_err();
        assert!(matches!(err, Error::InvalidRoot(_)));
    }

    #[test]
    fn test_plan_rejects_file_as_root() {
        let src = tempfile::tempdir().unwrap();
        let file = src.path().join("single.wav");
        touch(&file);
        let err = plan_tasks(&file, "/out", 44100, 16).unwrap_err();
        assert!(matches!(err, Error::InvalidRoot(_)));
    }

    #[test]
    fn test_empty_tree_yields_empty_plan() {
        let src = tempfile::tempdir().unwrap();
        let tasks = plan_tasks(src.path(), "/out", 44100, 16).unwrap();
        assert!(tasks.is_empty());
    }
}
