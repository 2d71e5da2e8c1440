use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

pub const DEFAULT_VOLUME: u8 = 50;

fn default_volume() -> i64 {
    DEFAULT_VOLUME as i64
}

/// On-disk form of the saved state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedSnapshot {
    #[serde(default)]
    pub tracks: Vec<PathBuf>,
    #[serde(default)]
    pub favorites: Vec<PathBuf>,
    #[serde(default)]
    pub current_path: Option<PathBuf>,
    #[serde(default)]
    pub is_shuffled: bool,
    #[serde(default = "default_volume")]
    pub volume: i64,
    /// Seconds since the Unix epoch at save time.
    #[serde(default)]
    pub timestamp: f64,
}

impl Default for PersistedSnapshot {
    fn default() -> Self {
        Self {
            tracks: Vec::new(),
            favorites: Vec::new(),
            current_path: None,
            is_shuffled: false,
            volume: default_volume(),
            timestamp: 0.0,
        }
    }
}

/// A loaded snapshot, pruned to files that still exist and with the current
/// track resolved to an index.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedState {
    pub tracks: Vec<PathBuf>,
    pub favorites: BTreeSet<PathBuf>,
    pub current: Option<usize>,
    pub is_shuffled: bool,
    pub volume: u8,
}

impl Default for PersistedState {
    fn default() -> Self {
        Self {
            tracks: Vec::new(),
            favorites: BTreeSet::new(),
            current: None,
            is_shuffled: false,
            volume: DEFAULT_VOLUME,
        }
    }
}

impl PersistedState {
    pub fn from_snapshot(snapshot: PersistedSnapshot) -> Self {
        let tracks: Vec<PathBuf> = snapshot.tracks.into_iter().filter(|p| p.exists()).collect();
        let favorites = snapshot
            .favorites
            .into_iter()
            .filter(|p| p.exists())
            .collect();
        let current = snapshot
            .current_path
            .and_then(|cur| tracks.iter().position(|p| *p == cur));

        Self {
            tracks,
            favorites,
            current,
            is_shuffled: snapshot.is_shuffled,
            volume: snapshot.volume.clamp(0, 100) as u8,
        }
    }
}

pub fn now_epoch_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}
