//! Playback session controller.
//!
//! One `Session` owns the whole story of "a file is open": it drives the
//! engine, feeds engine reports through the seek coordinator, keeps the
//! native subtitle policy reconciled, and records progress into the
//! recents registry. The UI layer calls plain methods here and renders
//! whatever [`Session::playback_state`] says.
//!
//! Threading: everything runs on one serialized context. Engines emit
//! [`EngineEvent`]s from their own threads; the host drains the channel
//! on the driving context and feeds [`Session::handle_event`]. The
//! periodic persistence tick is the host calling [`Session::update`].

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crossbeam_channel::Receiver;
use log::{debug, info, warn};

use crate::coordinator::{EngineAction, SeekCoordinator};
use crate::cue;
use crate::engine::{EngineEvent, PlaybackEngine, PlaybackState};
use crate::error::PlayerError;
use crate::media;
use crate::policy::{NativeSubtitlePolicy, SubtitleCommand};
use crate::recents::{self, RecentPlaybackEntry, RecentsRegistry};
use crate::remote::RemoteError;
use crate::store::RecentStore;
use crate::subtitle::{LoadedSubtitleTrack, SubtitleSource};

/// Skip button offset in seconds.
pub const SKIP_INTERVAL: f64 = 10.0;

/// Best-effort progress persistence cadence.
pub const PERSIST_INTERVAL: Duration = Duration::from_secs(5);

const RATE_RANGE: (f32, f32) = (0.5, 2.0);

/// The playback session: engine, cursor state, subtitles, recents.
pub struct Session {
    engine: Box<dyn PlaybackEngine>,
    registry: RecentsRegistry,
    store: RecentStore,
    coordinator: SeekCoordinator,
    policy: NativeSubtitlePolicy,
    state: PlaybackState,
    current_path: Option<PathBuf>,
    active_track: Option<LoadedSubtitleTrack>,
    status: String,
    rate: f32,
    volume: f32,
    muted: bool,
    /// Set when playback reached its natural end; pins persisted
    /// progress at zero until the user moves the cursor again.
    finished: bool,
    last_persist: Option<Instant>,
}

impl Session {
    pub fn new(engine: Box<dyn PlaybackEngine>, store: RecentStore) -> Self {
        let registry = store.load();

        let mut session = Self {
            engine,
            registry,
            store,
            coordinator: SeekCoordinator::new(),
            policy: NativeSubtitlePolicy::new(),
            state: PlaybackState::initial(),
            current_path: None,
            active_track: None,
            status: "Open a video file to start playback.".to_string(),
            rate: 1.0,
            volume: 1.0,
            muted: false,
            finished: false,
            last_persist: None,
        };

        session.engine.set_rate(session.rate);
        session.engine.set_volume(session.volume);
        session.engine.set_muted(session.muted);
        session
    }

    // ========== Opening media ==========

    /// Open a media file, resuming from persisted progress when eligible.
    ///
    /// Unsupported types set the status message and change nothing else.
    pub fn open(&mut self, path: &Path, autoplay: bool) -> Result<(), PlayerError> {
        if !media::is_supported_video(path) {
            let ext = media::extension_of(path);
            self.status = format!("Unsupported file type: .{ext}");
            return Err(PlayerError::UnsupportedFileType(ext));
        }

        // Flush the outgoing file's progress before switching.
        if self.current_path.is_some() {
            self.persist_now();
        }

        let normalized = media::normalize_path(path);
        let key = normalized.to_string_lossy().into_owned();
        let prior = self.registry.entry(&key).cloned();

        self.current_path = Some(normalized.clone());
        self.active_track = None;
        self.policy = NativeSubtitlePolicy::new();
        self.coordinator = SeekCoordinator::new();
        self.finished = false;
        self.state = PlaybackState {
            rate: self.rate,
            volume: self.volume,
            is_muted: self.muted,
            ..PlaybackState::initial()
        };

        let resume = self.registry.resume_eligible_position(&key);
        if let Some(target) = resume {
            let prime = !autoplay && self.engine.advertises_prime_for_resume();
            self.coordinator.begin_resume(target, prime);
        }

        info!(
            "Opening {} (autoplay={}, resume={:?})",
            normalized.display(),
            autoplay,
            resume
        );

        self.engine.load(&normalized, autoplay);
        self.policy.media_did_load();

        self.restore_subtitles(&normalized, prior.as_ref());

        // Seed the registry immediately so a crash right after open still
        // remembers the file. Progress carries over from the prior entry.
        let seed_position = resume
            .or(prior.as_ref().map(|e| e.last_playback_position))
            .unwrap_or(0.0);
        let subtitle = self
            .active_track
            .as_ref()
            .map(|t| t.selection_record())
            .or(prior.and_then(|e| e.selected_subtitle));
        self.registry.upsert(
            &key,
            seed_position,
            0.0,
            recents::now_unix(),
            subtitle,
            media::file_metadata(&normalized),
        );
        self.store.save(&self.registry);
        self.last_persist = Some(Instant::now());

        let name = normalized
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| key.clone());
        self.status = if resume.is_some() {
            format!("{name} (resuming)")
        } else {
            name
        };

        Ok(())
    }

    /// Reopen a remembered file.
    pub fn open_recent(&mut self, path: &str) -> Result<(), PlayerError> {
        self.open(Path::new(path), true)
    }

    /// Reopen the most recently played file, paused at its saved
    /// position. Returns `false` when there is nothing to restore.
    pub fn restore_last_session(&mut self) -> bool {
        let Some(path) = self.registry.most_recent().map(|e| e.file_path.clone()) else {
            return false;
        };

        self.open(Path::new(&path), false).is_ok()
    }

    // ========== Transport ==========

    pub fn toggle_play_pause(&mut self) {
        if self.state.is_playing {
            self.engine.pause();
        } else {
            self.engine.play();
        }
    }

    pub fn play(&mut self) {
        self.engine.play();
    }

    pub fn pause(&mut self) {
        self.engine.pause();
    }

    /// Explicit seek. Cancels any pending resume; while paused the
    /// requested time is held for display until the engine confirms.
    pub fn seek(&mut self, to: f64) {
        self.seek_internal(to, false);
    }

    /// Seek and persist the new position in the same breath (used for
    /// commit-on-release seeks).
    pub fn seek_and_persist(&mut self, to: f64) {
        self.seek_internal(to, true);
    }

    fn seek_internal(&mut self, to: f64, persist: bool) {
        let to = self.clamp_time(to);
        self.finished = false;
        let token = self.coordinator.note_user_seek(to, self.state.is_playing);
        self.engine.seek(to, token);
        self.state.current_time = to;

        if persist {
            self.persist_now();
        }
    }

    /// Scrub-drag seek. The displayed position updates immediately and
    /// unconditionally; engine dispatches are throttled.
    pub fn live_seek(&mut self, to: f64) {
        let to = self.clamp_time(to);
        self.finished = false;
        let _ = self.coordinator.note_user_seek(to, self.state.is_playing);
        self.state.current_time = to;

        if self.coordinator.should_dispatch_live_seek(Instant::now()) {
            let token = self.coordinator.next_token();
            self.engine.seek(to, token);
        }
    }

    pub fn skip_forward(&mut self) {
        self.skip(SKIP_INTERVAL);
    }

    pub fn skip_backward(&mut self) {
        self.skip(-SKIP_INTERVAL);
    }

    /// Skip by offset. The projected position is persisted immediately,
    /// without waiting for the engine to confirm, so progress survives an
    /// exit right after the skip.
    pub fn skip(&mut self, offset: f64) {
        self.coordinator.cancel_resume();
        self.finished = false;

        let projected =
            SeekCoordinator::project_skip(self.state.current_time, offset, self.state.duration);
        self.engine.skip(offset);

        debug!("Skip {:+}s, projected position {:.3}s", offset, projected);
        self.persist_progress_at(projected);
    }

    pub fn set_rate(&mut self, rate: f32) {
        self.rate = rate.clamp(RATE_RANGE.0, RATE_RANGE.1);
        self.engine.set_rate(self.rate);
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        self.engine.set_volume(self.volume);
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        self.engine.set_muted(muted);
    }

    // ========== Engine events ==========

    /// Drain all pending engine events from a channel receiver.
    pub fn drain(&mut self, receiver: &Receiver<EngineEvent>) {
        while let Ok(event) = receiver.try_recv() {
            self.handle_event(event);
        }
    }

    /// Handle one engine notification.
    pub fn handle_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::StateChanged(state) => self.handle_state(state),
            EngineEvent::SeekCompleted(token) => {
                if !self.coordinator.acknowledge_seek(token) {
                    debug!("Ignoring completion for superseded seek {:?}", token);
                }
            }
            EngineEvent::Finished => self.handle_finished(),
        }
    }

    fn handle_state(&mut self, state: PlaybackState) {
        let observation = self.coordinator.observe(&state);

        for action in &observation.actions {
            match *action {
                EngineAction::Seek { to, token } => self.engine.seek(to, token),
                EngineAction::Play => self.engine.play(),
                EngineAction::Pause => self.engine.pause(),
            }
        }

        self.state = observation.display;

        // Playback resumed after a natural end: progress counts again.
        if self.state.is_playing {
            self.finished = false;
        }

        // The engine may have re-selected a native track on its own.
        let commands = self.policy.reconcile(self.engine.subtitle_track_index());
        self.apply_subtitle_commands(commands);
    }

    fn handle_finished(&mut self) {
        info!("Playback finished");
        self.state.is_playing = false;
        self.state.current_time = 0.0;
        self.finished = true;

        let Some(key) = self.current_key() else {
            return;
        };
        self.coordinator.cancel_resume();
        self.registry.clear_progress(&key);
        self.store.save(&self.registry);
        self.last_persist = Some(Instant::now());
    }

    // ========== Subtitles ==========

    /// Load a subtitle file as the active overlay track.
    ///
    /// Manual failures surface through the status message and the
    /// returned error; the previously active track stays untouched.
    pub fn load_subtitle_file(
        &mut self,
        path: &Path,
        source: SubtitleSource,
    ) -> Result<(), PlayerError> {
        match LoadedSubtitleTrack::from_file(path, source) {
            Ok(track) => {
                self.activate_track(track);
                self.persist_now();
                Ok(())
            }
            Err(e) => {
                self.status = format!("Could not load subtitles: {e}");
                Err(e)
            }
        }
    }

    /// Install already downloaded subtitle text as the active track.
    pub fn install_remote_subtitles(
        &mut self,
        file_name: &str,
        text: &str,
    ) -> Result<(), PlayerError> {
        match LoadedSubtitleTrack::from_remote_text(file_name, text) {
            Ok(track) => {
                self.activate_track(track);
                self.persist_now();
                self.status = format!("Subtitles: {file_name}");
                Ok(())
            }
            Err(e) => {
                self.status = format!("Could not load subtitles: {e}");
                Err(e)
            }
        }
    }

    /// Remove the overlay track and hand rendering back to the engine.
    pub fn clear_subtitle_track(&mut self) {
        if self.active_track.take().is_none() {
            return;
        }

        let commands = self
            .policy
            .set_enabled(true, self.engine.subtitle_track_index());
        self.apply_subtitle_commands(commands);
        self.engine.set_native_subtitle_rendering_enabled(true);

        self.persist_now();
    }

    /// Surface a remote subtitle service failure to the user.
    pub fn report_remote_error(&mut self, error: &RemoteError) {
        warn!("{error}");
        self.status = error.to_string();
    }

    pub fn active_track(&self) -> Option<&LoadedSubtitleTrack> {
        self.active_track.as_ref()
    }

    /// Overlay cue text at the given playback time, if any.
    pub fn active_cue_text(&self, time: f64) -> Option<&str> {
        let track = self.active_track.as_ref()?;
        cue::active_cue_index(&track.cues, time).map(|idx| track.cues[idx].text.as_str())
    }

    fn activate_track(&mut self, track: LoadedSubtitleTrack) {
        debug!("Subtitle track active: {}", track.id);
        self.active_track = Some(track);

        let commands = self
            .policy
            .set_enabled(false, self.engine.subtitle_track_index());
        self.apply_subtitle_commands(commands);
        self.engine.set_native_subtitle_rendering_enabled(false);
    }

    fn apply_subtitle_commands(&mut self, commands: Vec<SubtitleCommand>) {
        for command in commands {
            match command {
                SubtitleCommand::SetTrack(index) => self.engine.set_subtitle_track(index),
            }
        }
    }

    /// Silent subtitle restoration on open: the persisted selection wins
    /// over a sidecar; failures load nothing and say nothing.
    fn restore_subtitles(&mut self, media_path: &Path, prior: Option<&RecentPlaybackEntry>) {
        let selection = prior.and_then(|e| e.selected_subtitle.as_ref());

        if let Some(sel) = selection {
            // Remote tracks have no on-disk source to reload.
            if sel.source != SubtitleSource::Remote {
                match LoadedSubtitleTrack::from_file(Path::new(&sel.path), sel.source) {
                    Ok(track) => {
                        self.activate_track(track);
                        return;
                    }
                    Err(e) => debug!("Persisted subtitle selection not restored: {e}"),
                }
            }
        }

        if let Some(sidecar) = media::find_sidecar_subtitle(media_path) {
            match LoadedSubtitleTrack::from_file(&sidecar, SubtitleSource::Auto) {
                Ok(track) => self.activate_track(track),
                Err(e) => debug!("Sidecar subtitles not loaded: {e}"),
            }
        }
    }

    // ========== Recents ==========

    pub fn recent_entries(&self) -> Vec<&RecentPlaybackEntry> {
        self.registry.entries().collect()
    }

    pub fn archived_entries(&self) -> Vec<&RecentPlaybackEntry> {
        self.registry.archived_entries().collect()
    }

    /// Move an entry to the archive. The currently open file cannot be
    /// archived.
    pub fn archive_recent(&mut self, path: &str) -> bool {
        if self.current_key().as_deref() == Some(path) {
            warn!("Refusing to archive the currently open file");
            return false;
        }

        let archived = self.registry.archive(path);
        if archived {
            self.store.save(&self.registry);
        }
        archived
    }

    pub fn restore_recent(&mut self, path: &str) -> bool {
        let restored = self.registry.restore(path);
        if restored {
            self.store.save(&self.registry);
        }
        restored
    }

    pub fn delete_recent_permanently(&mut self, path: &str) -> bool {
        let deleted = self.registry.delete_permanently(path);
        if deleted {
            self.store.save(&self.registry);
        }
        deleted
    }

    // ========== Persistence ==========

    /// Periodic tick from the host loop; persists progress every
    /// [`PERSIST_INTERVAL`] while media is open.
    pub fn update(&mut self, now: Instant) {
        if self.current_path.is_none() {
            return;
        }

        let due = match self.last_persist {
            Some(last) => now.duration_since(last) >= PERSIST_INTERVAL,
            None => true,
        };

        if due {
            self.persist_now();
        }
    }

    /// Persist progress for the open file right now. Also the
    /// termination flush (called from `Drop`).
    pub fn persist_now(&mut self) {
        // After a natural end the engine may keep reporting the end-of-media
        // time; the cleared progress must not be overwritten by a tick.
        let position = if self.finished {
            0.0
        } else {
            self.coordinator
                .pending_resume_target()
                .unwrap_or(self.state.current_time)
        };
        self.persist_progress_at(position);
    }

    fn persist_progress_at(&mut self, position: f64) {
        let Some(key) = self.current_key() else {
            return;
        };

        let subtitle = self.active_track.as_ref().map(|t| t.selection_record());
        let metadata = self
            .current_path
            .as_deref()
            .and_then(media::file_metadata);

        self.registry.upsert(
            &key,
            position,
            self.state.duration,
            recents::now_unix(),
            subtitle,
            metadata,
        );
        self.store.save(&self.registry);
        self.last_persist = Some(Instant::now());
    }

    // ========== Accessors ==========

    pub fn playback_state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn current_path(&self) -> Option<&Path> {
        self.current_path.as_deref()
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    fn current_key(&self) -> Option<String> {
        self.current_path
            .as_ref()
            .map(|p| p.to_string_lossy().into_owned())
    }

    fn clamp_time(&self, to: f64) -> f64 {
        if self.state.duration > 0.0 {
            to.clamp(0.0, self.state.duration)
        } else {
            to.max(0.0)
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.current_path.is_some() {
            self.persist_now();
        }
    }
}
