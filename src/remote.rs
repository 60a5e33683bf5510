//! Remote subtitle search contract.
//!
//! The network client is an external collaborator; the core only needs
//! search and download, both fallible. Downloaded text is fed into the
//! session via [`crate::session::Session::install_remote_subtitles`].

use thiserror::Error;

/// Failure talking to the subtitle service. Surfaced as a status message
/// with the reason; never retried automatically.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("subtitle service request failed: {0}")]
    Request(String),
    #[error("subtitle service returned an unusable response: {0}")]
    Response(String),
}

/// One search hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteSubtitleSearchResult {
    pub id: i64,
    /// Reference to hand back to [`SubtitleProvider::download`].
    pub file_ref: i64,
    pub file_name: String,
    pub language_code: String,
    pub language_name: Option<String>,
    pub release: Option<String>,
    pub title: Option<String>,
}

/// A downloaded subtitle file, already transcoded to text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteSubtitleFile {
    pub file_name: String,
    pub text: String,
}

/// Subtitle search/download service. Implementations do their own
/// transport and authentication; calls are expected to be issued off the
/// playback context and their results marshaled back by the host.
pub trait SubtitleProvider {
    fn search(&self, query: &str) -> Result<Vec<RemoteSubtitleSearchResult>, RemoteError>;
    fn download(&self, file_ref: i64) -> Result<RemoteSubtitleFile, RemoteError>;
}
