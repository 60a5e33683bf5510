//! VPLAY - Desktop video player playback core
//!
//! The session controller and its supporting pieces: SRT-style cue
//! engine, native subtitle rendering policy, recents registry with
//! archive lifecycle, and the resume/seek coordinator. UI chrome, file
//! dialogs, and concrete media engines live in the host application and
//! drive this crate through [`Session`] plus the [`PlaybackEngine`]
//! trait.

pub mod coordinator;
pub mod cue;
pub mod engine;
pub mod error;
pub mod markup;
pub mod media;
pub mod paths;
pub mod policy;
pub mod recents;
pub mod remote;
pub mod session;
pub mod store;
pub mod subtitle;

// Re-export the types a host application touches every day
pub use coordinator::SeekCoordinator;
pub use cue::{SubtitleCue, active_cue_index, format_playback_time};
pub use engine::{EngineEvent, EngineEventSender, PlaybackEngine, PlaybackState, SeekToken};
pub use error::PlayerError;
pub use policy::{NO_TRACK, NativeSubtitlePolicy, SubtitleCommand};
pub use recents::{RecentPlaybackEntry, RecentsRegistry};
pub use remote::{RemoteError, RemoteSubtitleFile, RemoteSubtitleSearchResult, SubtitleProvider};
pub use session::Session;
pub use store::RecentStore;
pub use subtitle::{LoadedSubtitleTrack, SelectedSubtitle, SubtitleSource};
