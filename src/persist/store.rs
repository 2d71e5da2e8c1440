use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::error::PersistenceError;

use super::snapshot::{PersistedSnapshot, PersistedState};

/// Reads and writes the snapshot file at a fixed location.
#[derive(Debug, Clone)]
pub struct PersistenceStore {
    path: PathBuf,
}

impl PersistenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse the snapshot file. `Ok(None)` when there is none yet.
    pub fn read_snapshot(&self) -> Result<Option<PersistedSnapshot>, PersistenceError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(&self.path)?;
        Ok(Some(serde_json::from_str(&text)?))
    }

    /// Load saved state, or the empty default if none can be read.
    pub fn load(&self) -> PersistedState {
        match self.read_snapshot() {
            Ok(Some(snapshot)) => {
                let state = PersistedState::from_snapshot(snapshot);
                info!(
                    "loaded state from {}: {} tracks, {} favorites",
                    self.path.display(),
                    state.tracks.len(),
                    state.favorites.len()
                );
                state
            }
            Ok(None) => {
                info!("no saved state at {}", self.path.display());
                PersistedState::default()
            }
            Err(e) => {
                warn!("ignoring unreadable state {}: {e}", self.path.display());
                PersistedState::default()
            }
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "state.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Write `snapshot` next to the target and rename it into place, so an
    /// interrupted save leaves the previous file intact. A failed save leaves
    /// no temp file behind.
    pub fn save(&self, snapshot: &PersistedSnapshot) -> Result<(), PersistenceError> {
        let json = serde_json::to_vec_pretty(snapshot)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let tmp = self.temp_path();
        if let Err(e) = write_synced(&tmp, &json).and_then(|()| fs::rename(&tmp, &self.path)) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        debug!(
            "saved {} tracks to {}",
            snapshot.tracks.len(),
            self.path.display()
        );
        Ok(())
    }
}

fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    writer.write_all(bytes)?;
    writer.flush()?;
    writer.get_ref().sync_all()
}
