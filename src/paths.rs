//! Application data paths with override support.
//!
//! Priority: explicit directory (host/CLI) → `VPLAY_CONFIG_DIR`
//! environment variable → platform data directory from dirs-next.
//!
//! Platform paths:
//! - Linux: ~/.local/share/vplay/{name}
//! - macOS: ~/Library/Application Support/vplay/{name}
//! - Windows: %APPDATA%\vplay\{name}

use anyhow::{Context, Result};
use std::path::PathBuf;

/// Configuration for overriding default application paths
#[derive(Debug, Clone, Default)]
pub struct PathConfig {
    /// Custom data directory (from host app or ENV)
    pub data_dir: Option<PathBuf>,
}

impl PathConfig {
    /// Create PathConfig from an explicit directory and environment.
    ///
    /// Priority: explicit dir → ENV var (VPLAY_CONFIG_DIR) → None (use defaults)
    pub fn from_env(explicit_dir: Option<PathBuf>) -> Self {
        let data_dir =
            explicit_dir.or_else(|| std::env::var("VPLAY_CONFIG_DIR").ok().map(PathBuf::from));

        Self { data_dir }
    }
}

/// Get path to a data file (recents store, logs, etc.)
pub fn data_file(name: &str, config: &PathConfig) -> PathBuf {
    get_data_dir(config).join(name)
}

/// Ensure the data directory exists. Returns error if creation fails.
pub fn ensure_dirs(config: &PathConfig) -> Result<()> {
    let data_dir = get_data_dir(config);

    if !data_dir.exists() {
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;
    }

    Ok(())
}

fn get_data_dir(config: &PathConfig) -> PathBuf {
    if let Some(dir) = &config.data_dir {
        return dir.clone();
    }

    if let Some(dir) = dirs_next::data_dir() {
        return dir.join("vplay");
    }

    // Fallback: "." if everything else fails
    PathBuf::from(".")
}
