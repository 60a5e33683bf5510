//! Resume/seek coordinator.
//!
//! Reconciles engine-reported time against pending resume requests and
//! user-initiated seeks. The engine reports state at its own cadence and
//! may report stale or jumpy times for a short window after a seek, so
//! naive mirroring fights the user; this module is the single writer of
//! display-time overrides.
//!
//! Rules:
//! - A pending resume re-seeks until the engine confirms within
//!   tolerance, then optionally pauses (prime-then-pause for engines
//!   that only honor seeks while playing).
//! - A seek while paused is held as the displayed time until the engine
//!   catches up within tolerance; any playing report drops the hold.
//! - Live (scrub) seeks are throttled toward the engine but the
//!   displayed position always updates immediately.
//! - Any user seek or skip cancels resume bookkeeping outright.

use std::time::{Duration, Instant};

use log::debug;

use crate::engine::{PlaybackState, SeekToken};

/// Engine-confirmation window for resume targets and paused-seek holds.
pub const RESUME_TOLERANCE: f64 = 0.35;

/// Minimum spacing between engine seeks while scrubbing.
pub const LIVE_SEEK_MIN_INTERVAL: Duration = Duration::from_millis(80);

/// Corrective commands the coordinator wants sent to the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EngineAction {
    Seek { to: f64, token: SeekToken },
    Play,
    Pause,
}

/// Result of feeding one engine state report through the coordinator.
#[derive(Debug, Clone)]
pub struct StateObservation {
    /// State the UI should display (current_time possibly overridden).
    pub display: PlaybackState,
    /// Commands to forward to the engine, in order.
    pub actions: Vec<EngineAction>,
}

/// Ephemeral per-session cursor state. Never persisted.
#[derive(Debug, Default)]
pub struct SeekCoordinator {
    pending_resume_target: Option<f64>,
    prime_for_resume: bool,
    pause_after_resume_seek: bool,
    paused_seek_hold: Option<f64>,
    last_live_seek_dispatch: Option<Instant>,
    latest_token: u64,
}

impl SeekCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm a resume to `target`. With `prime` set the engine is briefly
    /// played so it accepts the seek, then paused once confirmed.
    pub fn begin_resume(&mut self, target: f64, prime: bool) {
        debug!("Resume armed: target {:.3}s, prime={}", target, prime);
        self.pending_resume_target = Some(target);
        self.prime_for_resume = prime;
        self.pause_after_resume_seek = false;
    }

    pub fn has_pending_resume(&self) -> bool {
        self.pending_resume_target.is_some()
    }

    /// The armed resume position, if any. Progress persisted while a
    /// resume is pending records this target, not the engine's
    /// not-yet-seeked time.
    pub fn pending_resume_target(&self) -> Option<f64> {
        self.pending_resume_target
    }

    /// User intent overrides resume bookkeeping.
    pub fn cancel_resume(&mut self) {
        if self.pending_resume_target.take().is_some() {
            debug!("Pending resume cancelled by user action");
        }
        self.prime_for_resume = false;
        self.pause_after_resume_seek = false;
    }

    /// Token for the next seek dispatch. Supersedes all earlier tokens.
    pub fn next_token(&mut self) -> SeekToken {
        self.latest_token += 1;
        SeekToken(self.latest_token)
    }

    /// Whether a completion notification is for the latest dispatched
    /// seek. Superseded tokens must be discarded by the caller.
    pub fn acknowledge_seek(&self, token: SeekToken) -> bool {
        token.0 == self.latest_token
    }

    /// Register an explicit user seek. Cancels any pending resume and,
    /// while paused, holds the requested time for display until the
    /// engine confirms.
    pub fn note_user_seek(&mut self, to: f64, is_playing: bool) -> SeekToken {
        self.cancel_resume();
        self.paused_seek_hold = if is_playing { None } else { Some(to) };
        self.next_token()
    }

    /// Rate-limit gate for scrub seeks. The displayed position is the
    /// caller's concern and is never throttled.
    pub fn should_dispatch_live_seek(&mut self, now: Instant) -> bool {
        let due = match self.last_live_seek_dispatch {
            Some(last) => now.duration_since(last) >= LIVE_SEEK_MIN_INTERVAL,
            None => true,
        };

        if due {
            self.last_live_seek_dispatch = Some(now);
        }
        due
    }

    /// Projected position after a skip from the currently displayed
    /// time, clamped into the media's range. Persisted immediately so a
    /// crash before engine confirmation loses nothing.
    pub fn project_skip(displayed: f64, offset: f64, duration: f64) -> f64 {
        let projected = displayed + offset;
        if duration > 0.0 {
            projected.clamp(0.0, duration)
        } else {
            projected.max(0.0)
        }
    }

    /// Feed one engine state report through the resume and hold rules.
    pub fn observe(&mut self, state: &PlaybackState) -> StateObservation {
        let mut display = *state;
        let mut actions = Vec::new();

        // Paused-seek hold: never override while playing.
        if state.is_playing {
            self.paused_seek_hold = None;
        } else if let Some(hold) = self.paused_seek_hold {
            if (state.current_time - hold).abs() <= RESUME_TOLERANCE {
                // Engine caught up; trust it from here on.
                self.paused_seek_hold = None;
            } else {
                display.current_time = hold;
            }
        }

        // Pending resume: needs a known duration to clamp against.
        if let Some(raw_target) = self.pending_resume_target {
            if state.duration > 0.0 {
                let target = raw_target.clamp(0.0, (state.duration - 1.0).max(0.0));

                if (state.current_time - target).abs() <= RESUME_TOLERANCE {
                    debug!("Resume seek confirmed at {:.3}s", state.current_time);
                    self.pending_resume_target = None;
                    self.paused_seek_hold = None;

                    if self.pause_after_resume_seek {
                        self.pause_after_resume_seek = false;
                        actions.push(EngineAction::Pause);
                        display.is_playing = false;
                    }
                } else {
                    let token = self.next_token();
                    actions.push(EngineAction::Seek { to: target, token });
                    display.current_time = target;

                    if self.prime_for_resume && !state.is_playing {
                        self.prime_for_resume = false;
                        self.pause_after_resume_seek = true;
                        actions.push(EngineAction::Play);
                    }
                }
            }
        }

        StateObservation { display, actions }
    }
}
