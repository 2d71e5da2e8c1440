use std::{env, path::PathBuf};

use super::schema::Settings;

/// Configuration loading helpers.
///
/// `Settings::load` reads an optional config file first, then lets environment
/// variables (prefix `MEDLEY__`) override it, and falls back to struct defaults.
impl Settings {
    /// Load settings from environment and optional config file.
    pub fn load() -> Result<Self, ::config::ConfigError> {
        let config_path = resolve_config_path();

        let mut builder = ::config::Config::builder();

        if let Some(path) = &config_path {
            builder = builder.add_source(::config::File::from(path.as_path()).required(false));
        }

        builder = builder.add_source(
            ::config::Environment::with_prefix("MEDLEY")
                .separator("__")
                .try_parsing(true),
        );

        let cfg = builder.build()?;
        let settings: Settings = cfg.try_deserialize()?;
        Ok(settings)
    }

    /// Perform basic validation checks on loaded settings.
    pub fn validate(&self) -> Result<(), String> {
        if self.persistence.debounce_ms == 0 {
            return Err("persistence.debounce_ms must be >= 1".to_string());
        }
        if self.playback.poll_interval_ms == 0 {
            return Err("playback.poll_interval_ms must be >= 1".to_string());
        }
        if self.playback.volume > 100 {
            return Err("playback.volume must be within 0..=100".to_string());
        }
        Ok(())
    }

    /// Scan roots to use when none are given explicitly.
    pub fn scan_roots(&self) -> Vec<PathBuf> {
        if !self.library.roots.is_empty() {
            return self.library.roots.clone();
        }
        match home_dir() {
            Some(home) => vec![home.join("Music"), home.join("Downloads")],
            None => Vec::new(),
        }
    }

    /// Location of the saved session state.
    pub fn state_path(&self) -> PathBuf {
        self.persistence
            .state_path
            .clone()
            .or_else(default_state_path)
            .unwrap_or_else(|| PathBuf::from("medley-state.json"))
    }
}

pub fn home_dir() -> Option<PathBuf> {
    env::var_os("HOME")
        .or_else(|| env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}

/// Resolve the config path from `MEDLEY_CONFIG_PATH` or XDG defaults.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Some(p) = env::var_os("MEDLEY_CONFIG_PATH") {
        return Some(PathBuf::from(p));
    }
    default_config_path()
}

/// Compute the default config path under `$XDG_CONFIG_HOME/medley/config.toml`
/// or `~/.config/medley/config.toml` when `XDG_CONFIG_HOME` is not set.
pub fn default_config_path() -> Option<PathBuf> {
    let config_home = if let Some(xdg) = env::var_os("XDG_CONFIG_HOME") {
        Some(PathBuf::from(xdg))
    } else {
        home_dir().map(|h| h.join(".config"))
    };

    config_home.map(|d| d.join("medley").join("config.toml"))
}

/// Compute the default state file path under `$XDG_STATE_HOME/medley/state.json`
/// or `~/.local/state/medley/state.json`.
pub fn default_state_path() -> Option<PathBuf> {
    let state_home = if let Some(xdg) = env::var_os("XDG_STATE_HOME") {
        Some(PathBuf::from(xdg))
    } else {
        home_dir().map(|h| h.join(".local").join("state"))
    };

    state_home.map(|d| d.join("medley").join("state.json"))
}
