use std::path::PathBuf;

use serde::Deserialize;

/// Top-level application settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/medley/config.toml` or `~/.config/medley/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `MEDLEY__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub library: LibrarySettings,
    pub playback: PlaybackSettings,
    pub persistence: PersistenceSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LibrarySettings {
    /// Directories scanned on startup. Empty means `~/Music` and `~/Downloads`.
    pub roots: Vec<PathBuf>,
    /// Whether to follow symlinks during scanning.
    pub follow_links: bool,
    /// Whether the startup scan recurses without a depth cap.
    pub deep_scan: bool,
    /// Depth cap applied to non-deep scans (levels below each root).
    pub shallow_depth: usize,
    /// How long starting a new scan waits for the previous one to stop (milliseconds).
    pub cancel_wait_ms: u64,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            roots: Vec::new(),
            follow_links: true,
            deep_scan: false,
            shallow_depth: 5,
            cancel_wait_ms: 500,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    /// Initial volume (0-100) used when no saved state exists.
    pub volume: u8,
    /// `prev` restarts the current track instead of moving back once this
    /// many seconds have elapsed.
    pub restart_threshold_secs: u64,
    /// Interval at which the front end should call `App::tick` (milliseconds).
    pub poll_interval_ms: u64,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            volume: 50,
            restart_threshold_secs: 10,
            poll_interval_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PersistenceSettings {
    /// Override for the saved state file. Defaults to the XDG state directory.
    pub state_path: Option<PathBuf>,
    /// Minimum interval between two executed saves (milliseconds).
    pub debounce_ms: u64,
    /// Save pending changes from `App::tick` once the debounce window has passed.
    pub trailing_flush: bool,
}

impl Default for PersistenceSettings {
    fn default() -> Self {
        Self {
            state_path: None,
            debounce_ms: 500,
            trailing_flush: true,
        }
    }
}
