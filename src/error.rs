//! Error taxonomy for the playback core.
//!
//! Everything here is recoverable: the session swallows subtitle and
//! persistence failures internally and only user-initiated actions
//! (manual subtitle load, remote download) surface errors to the caller.

use thiserror::Error;

/// Errors surfaced by session and subtitle operations.
#[derive(Debug, Error)]
pub enum PlayerError {
    /// File extension is not a supported video format. Non-fatal: the
    /// session keeps whatever was playing before.
    #[error("unsupported file type: .{0}")]
    UnsupportedFileType(String),

    /// Subtitle bytes could not be decoded as UTF-8 or UTF-16, or the
    /// file could not be read at all.
    #[error("could not decode subtitles: {0}")]
    SubtitleDecode(String),

    /// Parsing succeeded but produced zero valid cues.
    #[error("no usable cues in subtitle file")]
    EmptyParsedTrack,
}
