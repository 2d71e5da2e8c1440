use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, warn};
use rand::Rng;

use crate::error::PlaybackError;
use crate::library::MetadataSource;

use super::engine::AudioEngine;
use super::types::{PlaybackState, RESTART_THRESHOLD, clamp_volume};

/// Single-track playback state machine over the library's track list.
///
/// The session does not own the track list; every command that needs it takes
/// the current `tracks` slice so indices always refer to the live library.
pub struct PlaybackSession {
    engine: Box<dyn AudioEngine>,
    state: PlaybackState,
    current: Option<usize>,
    shuffle: bool,
    volume: u8,
    duration_secs: f64,
    favorites: BTreeSet<PathBuf>,
    restart_threshold: Duration,
    /// Whether `current` has actually been handed to the engine. False after a
    /// restore, until the first resume.
    loaded: bool,
    dragging: bool,
}

impl PlaybackSession {
    pub fn new(engine: Box<dyn AudioEngine>, volume: u8) -> Self {
        let mut session = Self {
            engine,
            state: PlaybackState::NoTrack,
            current: None,
            shuffle: false,
            volume: 0,
            duration_secs: 0.0,
            favorites: BTreeSet::new(),
            restart_threshold: RESTART_THRESHOLD,
            loaded: false,
            dragging: false,
        };
        session.set_volume(volume as i32);
        session
    }

    pub fn with_restart_threshold(mut self, threshold: Duration) -> Self {
        self.restart_threshold = threshold;
        self
    }

    /// Apply saved state. A resolved `current` index starts the session
    /// paused on that track without loading it.
    pub fn restore(
        &mut self,
        current: Option<usize>,
        shuffle: bool,
        volume: u8,
        favorites: BTreeSet<PathBuf>,
    ) {
        self.current = current;
        self.state = if current.is_some() {
            PlaybackState::Paused
        } else {
            PlaybackState::NoTrack
        };
        self.loaded = false;
        self.duration_secs = 0.0;
        self.shuffle = shuffle;
        self.favorites = favorites;
        self.set_volume(volume as i32);
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current_path<'a>(&self, tracks: &'a [PathBuf]) -> Option<&'a Path> {
        self.current
            .and_then(|i| tracks.get(i))
            .map(PathBuf::as_path)
    }

    pub fn is_shuffled(&self) -> bool {
        self.shuffle
    }

    pub fn volume(&self) -> u8 {
        self.volume
    }

    /// Last-known duration of the current track in seconds, `0.0` if unknown.
    pub fn duration_secs(&self) -> f64 {
        self.duration_secs
    }

    pub fn favorites(&self) -> &BTreeSet<PathBuf> {
        &self.favorites
    }

    pub fn is_favorite(&self, path: &Path) -> bool {
        self.favorites.contains(path)
    }

    pub fn remove_favorite(&mut self, path: &Path) -> bool {
        self.favorites.remove(path)
    }

    /// Elapsed time reported by the engine for the current track.
    pub fn position(&self) -> Duration {
        if self.loaded {
            self.engine.position()
        } else {
            Duration::ZERO
        }
    }

    /// Load `tracks[index]` and start playing it. On error nothing changes.
    pub fn play_track(
        &mut self,
        tracks: &[PathBuf],
        index: usize,
        source: &dyn MetadataSource,
    ) -> Result<(), PlaybackError> {
        let path = tracks.get(index).ok_or(PlaybackError::IndexOutOfRange {
            index,
            len: tracks.len(),
        })?;
        if !path.exists() {
            return Err(PlaybackError::NotFound(path.clone()));
        }

        self.engine
            .load(path)
            .map_err(|e| PlaybackError::UnsupportedAudio {
                path: path.clone(),
                reason: e.to_string(),
            })?;
        self.engine.play();

        self.current = Some(index);
        self.state = PlaybackState::Playing;
        self.loaded = true;
        self.duration_secs = match self.engine.duration() {
            Some(d) if !d.is_zero() => d.as_secs_f64(),
            _ => source.read(path).duration_secs,
        };
        debug!("playing #{index}: {}", path.display());
        Ok(())
    }

    /// Play the track at `path`, if it is in `tracks`.
    pub fn play_path(
        &mut self,
        tracks: &[PathBuf],
        path: &Path,
        source: &dyn MetadataSource,
    ) -> Result<(), PlaybackError> {
        let index = tracks
            .iter()
            .position(|p| p == path)
            .ok_or_else(|| PlaybackError::NotFound(path.to_path_buf()))?;
        self.play_track(tracks, index, source)
    }

    pub fn play_pause(
        &mut self,
        tracks: &[PathBuf],
        source: &dyn MetadataSource,
    ) -> Result<(), PlaybackError> {
        match self.state {
            PlaybackState::NoTrack => {
                if tracks.is_empty() {
                    return Ok(());
                }
                self.play_track(tracks, 0, source)
            }
            PlaybackState::Paused => {
                let Some(index) = self.current else {
                    self.state = PlaybackState::NoTrack;
                    return Ok(());
                };
                if !self.loaded {
                    return self.play_track(tracks, index, source);
                }
                self.engine.play();
                self.state = PlaybackState::Playing;
                Ok(())
            }
            PlaybackState::Playing => {
                self.engine.pause();
                self.state = PlaybackState::Paused;
                Ok(())
            }
        }
    }

    fn next_index(&self, len: usize) -> usize {
        if self.shuffle {
            if len <= 1 {
                return 0;
            }
            let mut rng = rand::rng();
            loop {
                let candidate = rng.random_range(0..len);
                if Some(candidate) != self.current {
                    return candidate;
                }
            }
        }
        match self.current {
            Some(c) => (c + 1) % len,
            None => 0,
        }
    }

    pub fn next(
        &mut self,
        tracks: &[PathBuf],
        source: &dyn MetadataSource,
    ) -> Result<(), PlaybackError> {
        if tracks.is_empty() {
            return Ok(());
        }
        let index = self.next_index(tracks.len());
        self.play_track(tracks, index, source)
    }

    /// Restart the current track once it has played past the restart
    /// threshold, otherwise step back one track.
    pub fn prev(
        &mut self,
        tracks: &[PathBuf],
        source: &dyn MetadataSource,
    ) -> Result<(), PlaybackError> {
        if tracks.is_empty() {
            return Ok(());
        }

        if self.state == PlaybackState::Playing && self.position() > self.restart_threshold {
            if let Some(index) = self.current {
                if let Err(e) = self.engine.seek(Duration::ZERO) {
                    debug!("restart by seek failed ({e}), reloading track");
                    return self.play_track(tracks, index, source);
                }
                return Ok(());
            }
        }

        let len = tracks.len();
        let index = match self.current {
            Some(c) => (c + len - 1) % len,
            None => len - 1,
        };
        self.play_track(tracks, index, source)
    }

    /// Engine reported the current track finished.
    pub fn on_end_of_track(
        &mut self,
        tracks: &[PathBuf],
        source: &dyn MetadataSource,
    ) -> Result<(), PlaybackError> {
        self.next(tracks, source)
    }

    /// Advance when the engine signals the end of the current track. Returns
    /// whether an end-of-track was handled.
    pub fn poll_end_of_track(
        &mut self,
        tracks: &[PathBuf],
        source: &dyn MetadataSource,
    ) -> Result<bool, PlaybackError> {
        if self.state != PlaybackState::Playing || !self.engine.take_finished() {
            return Ok(false);
        }
        self.on_end_of_track(tracks, source)?;
        Ok(true)
    }

    /// Seek to `fraction` of the known duration. Ignored while the duration is
    /// unknown.
    pub fn seek(&mut self, fraction: f64) {
        if self.duration_secs <= 0.0 || self.current.is_none() || !fraction.is_finite() {
            return;
        }
        let target = Duration::from_secs_f64(self.duration_secs * fraction.clamp(0.0, 1.0));
        if let Err(e) = self.engine.seek(target) {
            warn!("seek to {:.1}s failed: {e}", target.as_secs_f64());
        }
    }

    /// Stop position polling while the user drags the seek control.
    pub fn begin_seek_drag(&mut self) {
        self.dragging = true;
    }

    pub fn end_seek_drag(&mut self, fraction: f64) {
        self.dragging = false;
        self.seek(fraction);
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Playback progress as a fraction of the duration, for the position
    /// display. `None` while not playing, while dragging, or when the
    /// duration is unknown.
    pub fn poll_position(&self) -> Option<f64> {
        if self.dragging || self.state != PlaybackState::Playing || self.duration_secs <= 0.0 {
            return None;
        }
        Some((self.position().as_secs_f64() / self.duration_secs).clamp(0.0, 1.0))
    }

    pub fn set_volume(&mut self, volume: i32) {
        self.volume = clamp_volume(volume);
        self.engine.set_volume(self.volume as f32 / 100.0);
    }

    pub fn toggle_shuffle(&mut self) -> bool {
        self.shuffle = !self.shuffle;
        self.shuffle
    }

    /// Flip the favorite flag of the current track. Returns the new flag.
    pub fn toggle_favorite(&mut self, tracks: &[PathBuf]) -> Result<bool, PlaybackError> {
        let path = self
            .current_path(tracks)
            .ok_or(PlaybackError::NoTrack)?
            .to_path_buf();
        if self.favorites.remove(&path) {
            Ok(false)
        } else {
            self.favorites.insert(path);
            Ok(true)
        }
    }

    /// Keep the session consistent after the library dropped the track that
    /// was at `index`.
    pub fn on_track_removed(&mut self, index: usize) {
        match self.current {
            Some(c) if c == index => self.stop(),
            Some(c) if c > index => self.current = Some(c - 1),
            _ => {}
        }
    }

    /// Stop the engine and forget the current track.
    pub fn stop(&mut self) {
        self.engine.stop();
        self.state = PlaybackState::NoTrack;
        self.current = None;
        self.loaded = false;
        self.duration_secs = 0.0;
    }
}
