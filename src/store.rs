//! Durable storage for the recents registry.
//!
//! One JSON file, full-state overwrite on every save. The write goes to a
//! sibling temp file first and is renamed into place, so readers never
//! observe a partial write. Saves are best-effort: failures are logged
//! and the next natural trigger retries; playback never blocks on disk.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::paths::{self, PathConfig};
use crate::recents::{RecentPlaybackEntry, RecentsRegistry};

/// Store file name. The `v1` suffix tracks the file, not the payload;
/// payload evolution is handled by `schema_version` inside.
pub const STORE_FILE_NAME: &str = "recent-playback.v1.json";

const SCHEMA_VERSION: u32 = 2;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Payload {
    schema_version: u32,
    entries: Vec<RecentPlaybackEntry>,
    /// Absent in schema 1 payloads; read as an empty archive.
    #[serde(default)]
    archived_entries: Vec<RecentPlaybackEntry>,
}

/// JSON-backed recents store.
#[derive(Debug)]
pub struct RecentStore {
    file_path: PathBuf,
}

impl RecentStore {
    /// Store at the platform default location (honoring `PathConfig`
    /// overrides).
    pub fn new(config: &PathConfig) -> Self {
        Self {
            file_path: paths::data_file(STORE_FILE_NAME, config),
        }
    }

    /// Store at an explicit path (tests, portable installs).
    pub fn with_path(file_path: PathBuf) -> Self {
        Self { file_path }
    }

    /// Load the registry. Missing or unreadable state yields an empty
    /// registry; corruption is logged, never fatal.
    pub fn load(&self) -> RecentsRegistry {
        let data = match fs::read_to_string(&self.file_path) {
            Ok(data) => data,
            Err(e) => {
                debug!("No recents state at {}: {}", self.file_path.display(), e);
                return RecentsRegistry::new();
            }
        };

        match serde_json::from_str::<Payload>(&data) {
            Ok(payload) => {
                debug!(
                    "Loaded recents state: schema {}, {} entries, {} archived",
                    payload.schema_version,
                    payload.entries.len(),
                    payload.archived_entries.len()
                );
                RecentsRegistry::from_entries(payload.entries, payload.archived_entries)
            }
            Err(e) => {
                warn!("Corrupt recents state at {}: {}", self.file_path.display(), e);
                RecentsRegistry::new()
            }
        }
    }

    /// Persist the registry, best-effort. Errors are logged and swallowed.
    pub fn save(&self, registry: &RecentsRegistry) {
        if let Err(e) = self.try_save(registry) {
            warn!("Failed to persist recents state: {:#}", e);
        }
    }

    fn try_save(&self, registry: &RecentsRegistry) -> Result<()> {
        let payload = Payload {
            schema_version: SCHEMA_VERSION,
            entries: registry.entries().cloned().collect(),
            archived_entries: registry.archived_entries().cloned().collect(),
        };

        let json = serde_json::to_string_pretty(&payload).context("serialize recents state")?;

        if let Some(parent) = self.file_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create store directory {}", parent.display()))?;
        }

        // Write-then-rename so a crash mid-write leaves the old state intact.
        let tmp_path = self.file_path.with_extension("json.tmp");
        fs::write(&tmp_path, json)
            .with_context(|| format!("write {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &self.file_path)
            .with_context(|| format!("replace {}", self.file_path.display()))?;

        Ok(())
    }
}
