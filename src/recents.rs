//! Recent playback registry.
//!
//! Durable mapping from normalized file path to last-known playback
//! progress, subtitle selection, and archive lifecycle. A path lives in
//! at most one of {recent, archive}. The registry is pure in-memory
//! state; the JSON store lives in [`crate::store`].

use indexmap::IndexMap;

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::media::FileMetadata;
use crate::subtitle::SelectedSubtitle;

/// Oldest entries are dropped past this count.
pub const MAX_RECENT_ENTRIES: usize = 50;

/// Progress at or beyond this fraction of duration counts as finished.
pub const NEAR_END_FRACTION: f64 = 0.98;

/// Current unix time in whole seconds.
pub fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// One remembered file. Keyed by normalized absolute path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentPlaybackEntry {
    pub file_path: String,
    /// Opaque relocation token from platform glue (e.g. a security
    /// bookmark); round-tripped, never interpreted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locator_token: Option<Vec<u8>>,
    pub last_playback_position: f64,
    pub duration: f64,
    /// Unix seconds.
    pub last_opened_at: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
    /// Unix seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_modified_at: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_subtitle: Option<SelectedSubtitle>,
}

impl RecentPlaybackEntry {
    /// Fraction watched, clamped to [0, 1]. Zero when duration unknown.
    pub fn progress_fraction(&self) -> f64 {
        if self.duration <= 0.0 {
            return 0.0;
        }
        (self.last_playback_position / self.duration).clamp(0.0, 1.0)
    }

    /// File name for list display.
    pub fn display_name(&self) -> String {
        Path::new(&self.file_path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.file_path.clone())
    }
}

/// In-memory recents + archive collections.
///
/// Both maps are keyed by normalized path and kept sorted by
/// `last_opened_at` descending (most recent first).
#[derive(Debug, Default)]
pub struct RecentsRegistry {
    entries: IndexMap<String, RecentPlaybackEntry>,
    archived: IndexMap<String, RecentPlaybackEntry>,
}

impl RecentsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted entry lists (store load).
    pub fn from_entries(
        entries: Vec<RecentPlaybackEntry>,
        archived: Vec<RecentPlaybackEntry>,
    ) -> Self {
        let mut registry = Self {
            entries: entries
                .into_iter()
                .map(|e| (e.file_path.clone(), e))
                .collect(),
            archived: archived
                .into_iter()
                .map(|e| (e.file_path.clone(), e))
                .collect(),
        };

        // Mutual exclusivity: recent wins over a duplicate archive entry.
        registry
            .archived
            .retain(|path, _| !registry.entries.contains_key(path));

        registry.sort_by_recency();
        registry
    }

    /// Record progress for a file, creating or merging its entry.
    ///
    /// Duration never shrinks (later reads are more authoritative), and
    /// position is clamped to `[0, merged duration]` so a not-yet-ready
    /// report with duration 0 cannot store a position past the known
    /// length. An archived entry for the same path is un-archived by the
    /// upsert.
    pub fn upsert(
        &mut self,
        path: &str,
        position: f64,
        duration: f64,
        opened_at: u64,
        subtitle: Option<SelectedSubtitle>,
        metadata: Option<FileMetadata>,
    ) {
        let duration = duration.max(0.0);

        // Re-opening un-archives.
        let archived = self.archived.shift_remove(path);

        if !self.entries.contains_key(path) {
            let seed = archived.unwrap_or_else(|| blank_entry(path));
            self.entries.insert(path.to_string(), seed);
        }

        if let Some(entry) = self.entries.get_mut(path) {
            entry.duration = entry.duration.max(duration);
            entry.last_playback_position = if entry.duration > 0.0 {
                position.clamp(0.0, entry.duration)
            } else {
                position.max(0.0)
            };
            entry.last_opened_at = opened_at;
            entry.selected_subtitle = subtitle;
            if let Some(meta) = metadata {
                entry.file_size = Some(meta.size);
                entry.content_modified_at = meta.modified_unix;
            }
        }

        self.sort_by_recency();

        while self.entries.len() > MAX_RECENT_ENTRIES {
            self.entries.pop(); // sorted desc, so pop drops the oldest
        }
    }

    /// Preserve an opaque relocation token for a path.
    pub fn set_locator_token(&mut self, path: &str, token: Vec<u8>) {
        if let Some(entry) = self.entries.get_mut(path) {
            entry.locator_token = Some(token);
        }
    }

    /// Position a reopened file should resume from, if any.
    ///
    /// `None` for unknown paths, zero progress, or near-complete progress
    /// (treated as finished). Known durations cap the target at
    /// `duration - 1` so resume never lands on the last second.
    pub fn resume_eligible_position(&self, path: &str) -> Option<f64> {
        let entry = self.entries.get(path)?;

        if entry.last_playback_position <= 0.0 {
            return None;
        }

        if entry.duration > 0.0 {
            if entry.last_playback_position / entry.duration >= NEAR_END_FRACTION {
                return None;
            }
            return Some(
                entry
                    .last_playback_position
                    .min((entry.duration - 1.0).max(0.0)),
            );
        }

        Some(entry.last_playback_position)
    }

    /// Reset stored position to zero, keeping the discovered duration.
    /// Used when playback reaches natural end.
    pub fn clear_progress(&mut self, path: &str) {
        if let Some(entry) = self.entries.get_mut(path) {
            entry.last_playback_position = 0.0;
        }
    }

    /// Move an entry from recent to archive. `false` if absent.
    pub fn archive(&mut self, path: &str) -> bool {
        match self.entries.shift_remove(path) {
            Some(entry) => {
                self.archived.insert(path.to_string(), entry);
                self.sort_by_recency();
                true
            }
            None => false,
        }
    }

    /// Move an entry back from archive to recent. `false` if absent.
    pub fn restore(&mut self, path: &str) -> bool {
        match self.archived.shift_remove(path) {
            Some(entry) => {
                self.entries.insert(path.to_string(), entry);
                self.sort_by_recency();
                true
            }
            None => false,
        }
    }

    /// Drop a path from both collections. `true` if anything was removed.
    pub fn delete_permanently(&mut self, path: &str) -> bool {
        let in_recent = self.entries.shift_remove(path).is_some();
        let in_archive = self.archived.shift_remove(path).is_some();
        in_recent || in_archive
    }

    pub fn entry(&self, path: &str) -> Option<&RecentPlaybackEntry> {
        self.entries.get(path)
    }

    /// Recent entries, most recently opened first.
    pub fn entries(&self) -> impl Iterator<Item = &RecentPlaybackEntry> {
        self.entries.values()
    }

    /// Archived entries, most recently opened first.
    pub fn archived_entries(&self) -> impl Iterator<Item = &RecentPlaybackEntry> {
        self.archived.values()
    }

    pub fn most_recent(&self) -> Option<&RecentPlaybackEntry> {
        self.entries.values().next()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.archived.is_empty()
    }

    fn sort_by_recency(&mut self) {
        self.entries
            .sort_by(|_, a, _, b| b.last_opened_at.cmp(&a.last_opened_at));
        self.archived
            .sort_by(|_, a, _, b| b.last_opened_at.cmp(&a.last_opened_at));
    }
}

fn blank_entry(path: &str) -> RecentPlaybackEntry {
    RecentPlaybackEntry {
        file_path: path.to_string(),
        locator_token: None,
        last_playback_position: 0.0,
        duration: 0.0,
        last_opened_at: 0,
        file_size: None,
        content_modified_at: None,
        selected_subtitle: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upsert(registry: &mut RecentsRegistry, path: &str, position: f64, duration: f64, at: u64) {
        registry.upsert(path, position, duration, at, None, None);
    }

    #[test]
    fn test_upsert_inserts_and_merges() {
        let mut registry = RecentsRegistry::new();
        upsert(&mut registry, "/a.mp4", 10.0, 100.0, 1);
        upsert(&mut registry, "/a.mp4", 20.0, 100.0, 2);

        let entry = registry.entry("/a.mp4").unwrap();
        assert_eq!(entry.last_playback_position, 20.0);
        assert_eq!(entry.last_opened_at, 2);
        assert_eq!(registry.entries().count(), 1);
    }

    #[test]
    fn test_position_clamped_to_duration() {
        let mut registry = RecentsRegistry::new();
        upsert(&mut registry, "/a.mp4", 150.0, 100.0, 1);
        assert_eq!(registry.entry("/a.mp4").unwrap().last_playback_position, 100.0);

        upsert(&mut registry, "/a.mp4", -5.0, 0.0, 2);
        assert_eq!(registry.entry("/a.mp4").unwrap().last_playback_position, 0.0);
    }

    #[test]
    fn test_position_clamped_against_retained_duration() {
        let mut registry = RecentsRegistry::new();
        upsert(&mut registry, "/a.mp4", 50.0, 200.0, 1);
        // Engine not ready yet: duration 0, position garbage.
        upsert(&mut registry, "/a.mp4", 500.0, 0.0, 2);

        let entry = registry.entry("/a.mp4").unwrap();
        assert_eq!(entry.duration, 200.0);
        assert_eq!(entry.last_playback_position, 200.0);
        assert_eq!(registry.resume_eligible_position("/a.mp4"), None);
    }

    #[test]
    fn test_duration_is_monotonic() {
        let mut registry = RecentsRegistry::new();
        upsert(&mut registry, "/a.mp4", 10.0, 300.0, 1);
        // A later report with duration 0 (engine not ready) must not shrink it.
        upsert(&mut registry, "/a.mp4", 12.0, 0.0, 2);

        assert_eq!(registry.entry("/a.mp4").unwrap().duration, 300.0);
    }

    #[test]
    fn test_sorted_by_recency_and_truncated() {
        let mut registry = RecentsRegistry::new();
        for i in 0..(MAX_RECENT_ENTRIES + 5) {
            upsert(&mut registry, &format!("/f{i}.mp4"), 1.0, 10.0, i as u64);
        }

        assert_eq!(registry.entries().count(), MAX_RECENT_ENTRIES);
        let first = registry.most_recent().unwrap();
        assert_eq!(first.file_path, format!("/f{}.mp4", MAX_RECENT_ENTRIES + 4));
        // Oldest entries were the ones dropped.
        assert!(registry.entry("/f0.mp4").is_none());
    }

    #[test]
    fn test_resume_eligibility() {
        let mut registry = RecentsRegistry::new();

        upsert(&mut registry, "/near-end.mp4", 294.0, 300.0, 1);
        assert_eq!(registry.resume_eligible_position("/near-end.mp4"), None);

        upsert(&mut registry, "/mid.mp4", 120.0, 300.0, 2);
        assert_eq!(registry.resume_eligible_position("/mid.mp4"), Some(120.0));

        upsert(&mut registry, "/zero.mp4", 0.0, 300.0, 3);
        assert_eq!(registry.resume_eligible_position("/zero.mp4"), None);

        assert_eq!(registry.resume_eligible_position("/unknown.mp4"), None);
    }

    #[test]
    fn test_resume_capped_below_last_second() {
        let mut registry = RecentsRegistry::new();
        // 9.5 of 10 is only 95% progress, but the cap pulls it to 9.
        upsert(&mut registry, "/short.mp4", 9.5, 10.0, 1);
        assert_eq!(registry.resume_eligible_position("/short.mp4"), Some(9.0));
    }

    #[test]
    fn test_resume_without_duration_returns_raw_position() {
        let mut registry = RecentsRegistry::new();
        upsert(&mut registry, "/raw.mp4", 33.0, 0.0, 1);
        assert_eq!(registry.resume_eligible_position("/raw.mp4"), Some(33.0));
    }

    #[test]
    fn test_clear_progress_keeps_duration() {
        let mut registry = RecentsRegistry::new();
        upsert(&mut registry, "/a.mp4", 80.0, 200.0, 1);

        registry.clear_progress("/a.mp4");
        let entry = registry.entry("/a.mp4").unwrap();
        assert_eq!(entry.last_playback_position, 0.0);
        assert_eq!(entry.duration, 200.0);
    }

    #[test]
    fn test_archive_restore_roundtrip() {
        let mut registry = RecentsRegistry::new();
        upsert(&mut registry, "/a.mp4", 10.0, 100.0, 1);

        assert!(registry.archive("/a.mp4"));
        assert!(registry.entry("/a.mp4").is_none());
        assert_eq!(registry.archived_entries().count(), 1);

        assert!(registry.restore("/a.mp4"));
        assert!(registry.entry("/a.mp4").is_some());
        assert_eq!(registry.archived_entries().count(), 0);
    }

    #[test]
    fn test_delete_permanently_from_archive() {
        let mut registry = RecentsRegistry::new();
        upsert(&mut registry, "/a.mp4", 10.0, 100.0, 1);
        registry.archive("/a.mp4");

        assert!(registry.delete_permanently("/a.mp4"));
        assert!(registry.entry("/a.mp4").is_none());
        assert_eq!(registry.archived_entries().count(), 0);
        assert!(!registry.delete_permanently("/a.mp4"));
    }

    #[test]
    fn test_upsert_unarchives_and_keeps_progress_merge() {
        let mut registry = RecentsRegistry::new();
        upsert(&mut registry, "/a.mp4", 50.0, 200.0, 1);
        registry.archive("/a.mp4");

        upsert(&mut registry, "/a.mp4", 60.0, 0.0, 2);
        let entry = registry.entry("/a.mp4").unwrap();
        assert_eq!(entry.last_playback_position, 60.0);
        assert_eq!(entry.duration, 200.0); // carried over from the archived entry
        assert_eq!(registry.archived_entries().count(), 0);
    }

    #[test]
    fn test_from_entries_enforces_mutual_exclusivity() {
        let mut a = blank_entry("/a.mp4");
        a.last_opened_at = 5;
        let dup = blank_entry("/a.mp4");
        let b = blank_entry("/b.mp4");

        let registry = RecentsRegistry::from_entries(vec![a], vec![dup, b]);
        assert_eq!(registry.entries().count(), 1);
        assert_eq!(registry.archived_entries().count(), 1);
        assert_eq!(registry.archived_entries().next().unwrap().file_path, "/b.mp4");
    }

    #[test]
    fn test_progress_fraction_and_display_name() {
        let mut entry = blank_entry("/films/night.mkv");
        entry.last_playback_position = 50.0;
        entry.duration = 200.0;

        assert_eq!(entry.progress_fraction(), 0.25);
        assert_eq!(entry.display_name(), "night.mkv");

        entry.duration = 0.0;
        assert_eq!(entry.progress_fraction(), 0.0);
    }
}
