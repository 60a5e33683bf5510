//! Backend contract: the capability set the session needs from a media
//! engine, plus the notification channel engines report through.
//!
//! Concrete engines (VLC, AVFoundation, gstreamer, ...) live outside this
//! crate. The session holds one `Box<dyn PlaybackEngine>` and never
//! branches on engine identity. Engines run their own decode threads but
//! talk back only through [`EngineEvent`]s, drained by the host on the
//! same serialized context that drives the session.

use std::path::Path;

use crossbeam_channel::Sender;

use crate::policy::NO_TRACK;

/// Snapshot of backend playback state, emitted at ~2Hz and on every
/// user-visible transition. Produced exclusively by the engine; only the
/// seek coordinator may override `current_time` for display.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackState {
    pub is_playing: bool,
    pub current_time: f64,
    pub duration: f64,
    pub rate: f32,
    pub volume: f32,
    pub is_muted: bool,
}

impl PlaybackState {
    /// State before any media is loaded.
    pub fn initial() -> Self {
        Self {
            is_playing: false,
            current_time: 0.0,
            duration: 0.0,
            rate: 1.0,
            volume: 1.0,
            is_muted: false,
        }
    }
}

/// Monotonically increasing seek request identifier.
///
/// Every seek dispatched to the engine carries a token; completion
/// notifications for superseded tokens are silently discarded, so a
/// rapid-fire seek sequence never acts on a stale confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SeekToken(pub u64);

/// Asynchronous notifications from the engine to the session.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// Regular state report or user-visible transition.
    StateChanged(PlaybackState),
    /// A previously dispatched seek settled. Stale tokens are ignored.
    SeekCompleted(SeekToken),
    /// Media reached its natural end. Emitted once per load.
    Finished,
}

/// Event sender handed to engines at construction.
///
/// Engines emit through this from any thread; the host drains the channel
/// on the serialized context. The dummy variant is for tests and for
/// engines wired up before a session exists.
#[derive(Clone, Debug)]
pub struct EngineEventSender {
    sender: Option<Sender<EngineEvent>>,
}

impl EngineEventSender {
    /// Create event sender (connected to channel)
    pub fn new(sender: Sender<EngineEvent>) -> Self {
        Self {
            sender: Some(sender),
        }
    }

    /// Create dummy sender (for tests or when events not needed)
    pub fn dummy() -> Self {
        Self { sender: None }
    }

    /// Emit event (silent if no receiver)
    pub fn emit(&self, event: EngineEvent) {
        if let Some(ref tx) = self.sender {
            let _ = tx.send(event); // Ignore send errors (receiver might be dropped)
        }
    }
}

impl Default for EngineEventSender {
    fn default() -> Self {
        Self::dummy()
    }
}

/// Capability set of a playback backend.
///
/// All calls are fire-and-forget: nothing blocks waiting for the engine,
/// and confirmation arrives (if at all) as an [`EngineEvent`].
pub trait PlaybackEngine {
    fn load(&mut self, path: &Path, autoplay: bool);
    fn play(&mut self);
    fn pause(&mut self);
    fn seek(&mut self, to: f64, token: SeekToken);
    fn skip(&mut self, offset: f64);
    fn set_rate(&mut self, rate: f32);
    fn set_volume(&mut self, volume: f32);
    fn set_muted(&mut self, muted: bool);

    /// Hint for engines whose subtitle renderer cannot be controlled via
    /// track selection. Engines with indexed tracks can ignore this; the
    /// session also drives [`set_subtitle_track`](Self::set_subtitle_track)
    /// through the native rendering policy.
    fn set_native_subtitle_rendering_enabled(&mut self, _enabled: bool) {}

    /// Select a native subtitle track; [`NO_TRACK`] disables all.
    fn set_subtitle_track(&mut self, index: i32);

    /// Currently selected native subtitle track, [`NO_TRACK`] if none.
    /// Engines assign indices asynchronously after load, so this drifts
    /// and is re-read on every state tick.
    fn subtitle_track_index(&self) -> i32 {
        NO_TRACK
    }

    /// Whether the engine needs to be briefly playing to honor a seek
    /// while paused. When advertised, a paused resume is primed with a
    /// play and paused again once the seek confirms.
    fn advertises_prime_for_resume(&self) -> bool {
        false
    }
}
