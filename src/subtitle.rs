//! Loaded subtitle tracks and the persisted selection record.
//!
//! At most one track is active per session. A track's identity is its
//! source kind plus the normalized origin path, so re-selecting the same
//! sidecar file yields the same id across launches.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::cue::{self, SubtitleCue};
use crate::error::PlayerError;
use crate::media;

/// Where a subtitle track came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubtitleSource {
    /// Sidecar file auto-detected next to the media.
    Auto,
    /// File the user picked explicitly.
    Manual,
    /// Downloaded from the remote subtitle service.
    Remote,
}

impl SubtitleSource {
    fn kind(self) -> &'static str {
        match self {
            SubtitleSource::Auto => "auto",
            SubtitleSource::Manual => "manual",
            SubtitleSource::Remote => "remote",
        }
    }

    /// Short label for status lines and track pickers.
    pub fn label(self) -> &'static str {
        match self {
            SubtitleSource::Auto => "Auto-detected",
            SubtitleSource::Manual => "Manual",
            SubtitleSource::Remote => "Downloaded",
        }
    }
}

/// A parsed subtitle track owned by the session.
#[derive(Debug, Clone)]
pub struct LoadedSubtitleTrack {
    /// Source kind + normalized origin, stable across launches.
    pub id: String,
    pub source: SubtitleSource,
    pub display_name: String,
    /// File path for Auto/Manual tracks, remote file name for Remote.
    pub origin: String,
    pub cues: Vec<SubtitleCue>,
}

impl LoadedSubtitleTrack {
    /// Load and parse a subtitle file from disk.
    pub fn from_file(path: &Path, source: SubtitleSource) -> Result<Self, PlayerError> {
        let data = fs::read(path)
            .map_err(|e| PlayerError::SubtitleDecode(format!("{}: {}", path.display(), e)))?;
        let cues = cue::parse_bytes(&data)?;

        if cues.is_empty() {
            return Err(PlayerError::EmptyParsedTrack);
        }

        let normalized = media::normalize_path(path);
        let display_name = normalized
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| normalized.to_string_lossy().into_owned());

        Ok(Self {
            id: format!("{}:{}", source.kind(), normalized.display()),
            source,
            display_name,
            origin: normalized.to_string_lossy().into_owned(),
            cues,
        })
    }

    /// Build a track from already downloaded subtitle text.
    pub fn from_remote_text(file_name: &str, text: &str) -> Result<Self, PlayerError> {
        let cues = cue::parse_str(text);
        if cues.is_empty() {
            return Err(PlayerError::EmptyParsedTrack);
        }

        Ok(Self {
            id: format!("remote:{file_name}"),
            source: SubtitleSource::Remote,
            display_name: file_name.to_string(),
            origin: file_name.to_string(),
            cues,
        })
    }

    /// Persisted selection record for this track.
    pub fn selection_record(&self) -> SelectedSubtitle {
        SelectedSubtitle {
            path: self.origin.clone(),
            locator_token: None,
            display_name: self.display_name.clone(),
            source: self.source,
        }
    }
}

/// Subtitle selection as stored in a recents entry, so reopening a file
/// restores its track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedSubtitle {
    pub path: String,
    /// Opaque relocation token supplied by platform glue; round-tripped
    /// without interpretation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locator_token: Option<Vec<u8>>,
    pub display_name: String,
    pub source: SubtitleSource,
}

#[cfg(test)]
mod tests {
    use super::*;

    const SRT: &str = "1\n00:00:01,000 --> 00:00:02,000\nHello\n";

    #[test]
    fn test_from_file_parses_and_ids() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("movie.srt");
        fs::write(&path, SRT).unwrap();

        let track = LoadedSubtitleTrack::from_file(&path, SubtitleSource::Manual).unwrap();
        assert_eq!(track.cues.len(), 1);
        assert_eq!(track.display_name, "movie.srt");
        assert!(track.id.starts_with("manual:"));
    }

    #[test]
    fn test_from_file_missing_is_decode_error() {
        let err = LoadedSubtitleTrack::from_file(
            Path::new("/missing/file.srt"),
            SubtitleSource::Auto,
        )
        .unwrap_err();
        assert!(matches!(err, PlayerError::SubtitleDecode(_)));
    }

    #[test]
    fn test_empty_parse_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.srt");
        fs::write(&path, "no cues here\n").unwrap();

        let err = LoadedSubtitleTrack::from_file(&path, SubtitleSource::Manual).unwrap_err();
        assert!(matches!(err, PlayerError::EmptyParsedTrack));
    }

    #[test]
    fn test_remote_track() {
        let track = LoadedSubtitleTrack::from_remote_text("ep1.srt", SRT).unwrap();
        assert_eq!(track.source, SubtitleSource::Remote);
        assert_eq!(track.id, "remote:ep1.srt");

        let record = track.selection_record();
        assert_eq!(record.display_name, "ep1.srt");
        assert_eq!(record.source, SubtitleSource::Remote);
    }
}
