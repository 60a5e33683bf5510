//! Native subtitle rendering policy.
//!
//! Overlay-rendered cues and the engine's own subtitle renderer must
//! never both be visible. While an overlay track is selected this policy
//! forces the engine's native track off, remembering which track the
//! engine had picked so it can be restored losslessly when the overlay
//! track is removed. Engines assign track indices asynchronously after
//! load and may unilaterally re-select, so the policy is reconciled on
//! every state tick.

/// Sentinel the engine reports when no native subtitle track is selected.
pub const NO_TRACK: i32 = -1;

/// Commands the policy asks the session to forward to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubtitleCommand {
    SetTrack(i32),
}

/// Two-state machine: native rendering enabled or suppressed, plus the
/// cached track index used only while suppressed.
#[derive(Debug, Clone)]
pub struct NativeSubtitlePolicy {
    enabled: bool,
    cached_track: Option<i32>,
}

impl Default for NativeSubtitlePolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl NativeSubtitlePolicy {
    pub fn new() -> Self {
        Self {
            enabled: true,
            cached_track: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// A new media load invalidates any cached track index.
    pub fn media_did_load(&mut self) {
        self.cached_track = None;
    }

    /// Switch native rendering on or off. No-op if already in the target
    /// state.
    pub fn set_enabled(&mut self, enabled: bool, current_track: i32) -> Vec<SubtitleCommand> {
        if self.enabled == enabled {
            return Vec::new();
        }

        self.enabled = enabled;
        self.reconcile(current_track)
    }

    /// Re-apply the current state's invariant against the engine's actual
    /// track selection. Idempotent; called after every state tick.
    pub fn reconcile(&mut self, current_track: i32) -> Vec<SubtitleCommand> {
        if self.enabled {
            self.restore_if_needed(current_track)
        } else {
            self.suppress_if_needed(current_track)
        }
    }

    fn restore_if_needed(&mut self, current_track: i32) -> Vec<SubtitleCommand> {
        let Some(cached) = self.cached_track.take() else {
            return Vec::new();
        };

        if current_track == cached {
            return Vec::new();
        }

        vec![SubtitleCommand::SetTrack(cached)]
    }

    fn suppress_if_needed(&mut self, current_track: i32) -> Vec<SubtitleCommand> {
        if current_track != NO_TRACK && self.cached_track.is_none() {
            self.cached_track = Some(current_track);
        }

        if current_track == NO_TRACK {
            return Vec::new();
        }

        vec![SubtitleCommand::SetTrack(NO_TRACK)]
    }
}
