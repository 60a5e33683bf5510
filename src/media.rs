//! Media file helpers: supported formats, path identity, sidecar
//! subtitle discovery, file metadata.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

/// Supported video file extensions
pub const VIDEO_EXTS: &[&str] = &["mp4", "m4v", "mkv"];

/// Supported subtitle file extensions
pub const SUBTITLE_EXTS: &[&str] = &["srt"];

/// Check if file is a supported video format
pub fn is_supported_video(path: &Path) -> bool {
    has_extension(path, VIDEO_EXTS)
}

/// Check if file is a supported subtitle format
pub fn is_subtitle(path: &Path) -> bool {
    has_extension(path, SUBTITLE_EXTS)
}

fn has_extension(path: &Path, exts: &[&str]) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|s| exts.contains(&s.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Lowercased extension for error messages; empty string if none.
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase())
        .unwrap_or_default()
}

/// Stable identity for a media file: absolute, symlink-resolved where the
/// file exists, otherwise absolutized against the current directory.
/// Used as the key for recents entries.
pub fn normalize_path(path: &Path) -> PathBuf {
    if let Ok(canonical) = fs::canonicalize(path) {
        return canonical;
    }

    if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    }
}

/// Sidecar subtitle candidate for a media file: same directory, same
/// stem, `.srt` extension. Existence is not checked.
pub fn sidecar_subtitle_path(media: &Path) -> PathBuf {
    media.with_extension("srt")
}

/// Sidecar subtitle next to the media file, if one actually exists.
pub fn find_sidecar_subtitle(media: &Path) -> Option<PathBuf> {
    let candidate = sidecar_subtitle_path(media);
    if candidate.is_file() { Some(candidate) } else { None }
}

/// On-disk facts about a media file, captured into recents entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileMetadata {
    pub size: u64,
    pub modified_unix: Option<u64>,
}

/// Probe size and mtime; `None` if the file is unreadable.
pub fn file_metadata(path: &Path) -> Option<FileMetadata> {
    let meta = fs::metadata(path).ok()?;
    let modified_unix = meta
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs());

    Some(FileMetadata {
        size: meta.len(),
        modified_unix,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_video_extensions() {
        assert!(is_supported_video(Path::new("/a/movie.mp4")));
        assert!(is_supported_video(Path::new("/a/Movie.MKV")));
        assert!(is_supported_video(Path::new("clip.m4v")));
        assert!(!is_supported_video(Path::new("/a/movie.avi")));
        assert!(!is_supported_video(Path::new("/a/noext")));
    }

    #[test]
    fn test_subtitle_extension() {
        assert!(is_subtitle(Path::new("movie.srt")));
        assert!(!is_subtitle(Path::new("movie.sub")));
    }

    #[test]
    fn test_sidecar_path_shares_stem() {
        let sidecar = sidecar_subtitle_path(Path::new("/films/night.mkv"));
        assert_eq!(sidecar, PathBuf::from("/films/night.srt"));
    }

    #[test]
    fn test_normalize_missing_file_stays_absolute() {
        let p = Path::new("/definitely/missing/movie.mp4");
        assert_eq!(normalize_path(p), p.to_path_buf());
    }

    #[test]
    fn test_normalize_relative_is_absolutized() {
        let normalized = normalize_path(Path::new("some-movie.mp4"));
        assert!(normalized.is_absolute());
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of(Path::new("a.WebM")), "webm");
        assert_eq!(extension_of(Path::new("a")), "");
    }

    #[test]
    fn test_file_metadata_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("clip.mp4");
        std::fs::write(&file, b"0123456789").unwrap();

        let meta = file_metadata(&file).unwrap();
        assert_eq!(meta.size, 10);
        assert!(meta.modified_unix.is_some());

        assert!(file_metadata(&dir.path().join("missing.mp4")).is_none());
    }
}
