//! Application model: `App` and its command interface.
//!
//! All state is owned here and mutated on the caller's thread. The scanner is
//! the only background worker; its results reach the index through
//! [`App::poll_scan`].

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::config::Settings;
use crate::error::{AppResult, EngineError, PersistenceError};
use crate::library::{
    LibraryIndex, LoftyMetadata, MetadataSource, NowPlaying, ScanEvent, ScanHandle, ScanOptions,
    TagEdit, TrackMetadata, collect_audio_files, resolve,
};
use crate::persist::{
    PersistedSnapshot, PersistedState, PersistenceStore, SaveScheduler, now_epoch_secs,
};
use crate::playback::{AudioEngine, PlaybackSession, PlaybackState, RodioEngine};

use super::trash::{SystemTrash, TrashBin};

/// The main application model.
pub struct App {
    settings: Settings,
    index: LibraryIndex,
    session: PlaybackSession,
    store: PersistenceStore,
    scheduler: SaveScheduler,
    metadata: Box<dyn MetadataSource>,
    trash: Box<dyn TrashBin>,
    scan: Option<ScanHandle>,
    status: String,
}

impl App {
    /// Build the production app: `rodio` output, `lofty` tags, system trash.
    pub fn open(settings: Settings) -> Result<Self, EngineError> {
        let engine = RodioEngine::open_default()?;
        Ok(Self::new(
            settings,
            Box::new(engine),
            Box::new(LoftyMetadata),
            Box::new(SystemTrash),
        ))
    }

    /// Create an `App` from its collaborators and restore saved state.
    pub fn new(
        settings: Settings,
        engine: Box<dyn AudioEngine>,
        metadata: Box<dyn MetadataSource>,
        trash: Box<dyn TrashBin>,
    ) -> Self {
        let store = PersistenceStore::new(settings.state_path());
        let state = if store.path().exists() {
            store.load()
        } else {
            PersistedState {
                volume: settings.playback.volume.min(100),
                ..PersistedState::default()
            }
        };

        let index = LibraryIndex::from_tracks(state.tracks, metadata.as_ref());

        let mut session = PlaybackSession::new(engine, state.volume).with_restart_threshold(
            Duration::from_secs(settings.playback.restart_threshold_secs),
        );
        session.restore(state.current, state.is_shuffled, state.volume, state.favorites);

        let scheduler = SaveScheduler::new(Duration::from_millis(settings.persistence.debounce_ms));

        Self {
            settings,
            index,
            session,
            store,
            scheduler,
            metadata,
            trash,
            scan: None,
            status: String::new(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn index(&self) -> &LibraryIndex {
        &self.index
    }

    pub fn session(&self) -> &PlaybackSession {
        &self.session
    }

    /// Last status line produced by a command or the scanner.
    pub fn status(&self) -> &str {
        &self.status
    }

    fn set_status(&mut self, msg: impl Into<String>) {
        self.status = msg.into();
        info!("{}", self.status);
    }

    // ---------- persistence ----------

    pub fn snapshot(&self) -> PersistedSnapshot {
        let tracks = self.index.all_tracks();
        PersistedSnapshot {
            tracks: tracks.to_vec(),
            favorites: self.session.favorites().iter().cloned().collect(),
            current_path: self.session.current_path(tracks).map(Path::to_path_buf),
            is_shuffled: self.session.is_shuffled(),
            volume: self.session.volume() as i64,
            timestamp: now_epoch_secs(),
        }
    }

    /// Save immediately, bypassing the debounce interval.
    pub fn save_now(&mut self) -> Result<(), PersistenceError> {
        match self.store.save(&self.snapshot()) {
            Ok(()) => {
                self.scheduler.mark_saved(Instant::now());
                Ok(())
            }
            Err(e) => {
                warn!("failed to save state to {}: {e}", self.store.path().display());
                self.status = "Failed to save state.".to_string();
                Err(e)
            }
        }
    }

    /// Record a change and save if the debounce interval allows it.
    fn request_save(&mut self) {
        if self.scheduler.request(Instant::now()) {
            // Failures are already logged and reported through `status`.
            let _ = self.save_now();
        } else {
            debug!("save deferred, state marked dirty");
        }
    }

    // ---------- playback commands ----------

    pub fn play_pause(&mut self) -> AppResult<()> {
        self.session
            .play_pause(self.index.all_tracks(), self.metadata.as_ref())?;
        self.request_save();
        Ok(())
    }

    pub fn play_track(&mut self, index: usize) -> AppResult<()> {
        self.session
            .play_track(self.index.all_tracks(), index, self.metadata.as_ref())?;
        self.request_save();
        Ok(())
    }

    pub fn play_path(&mut self, path: &Path) -> AppResult<()> {
        self.session
            .play_path(self.index.all_tracks(), path, self.metadata.as_ref())?;
        self.request_save();
        Ok(())
    }

    pub fn next(&mut self) -> AppResult<()> {
        self.session
            .next(self.index.all_tracks(), self.metadata.as_ref())?;
        self.request_save();
        Ok(())
    }

    pub fn prev(&mut self) -> AppResult<()> {
        self.session
            .prev(self.index.all_tracks(), self.metadata.as_ref())?;
        self.request_save();
        Ok(())
    }

    pub fn seek(&mut self, fraction: f64) {
        self.session.seek(fraction);
    }

    pub fn begin_seek_drag(&mut self) {
        self.session.begin_seek_drag();
    }

    pub fn end_seek_drag(&mut self, fraction: f64) {
        self.session.end_seek_drag(fraction);
    }

    pub fn set_volume(&mut self, volume: i32) {
        self.session.set_volume(volume);
        self.request_save();
    }

    pub fn toggle_shuffle(&mut self) -> bool {
        let on = self.session.toggle_shuffle();
        self.request_save();
        on
    }

    pub fn toggle_favorite(&mut self) -> AppResult<bool> {
        let on = self.session.toggle_favorite(self.index.all_tracks())?;
        self.request_save();
        Ok(on)
    }

    /// Timer callback: follows end-of-track, performs trailing saves and
    /// returns the playback progress for the position display.
    pub fn tick(&mut self) -> AppResult<Option<f64>> {
        let advanced = self
            .session
            .poll_end_of_track(self.index.all_tracks(), self.metadata.as_ref());
        match advanced {
            Ok(true) => self.request_save(),
            Ok(false) => {}
            Err(e) => {
                // The next track could not be played; stay where we are.
                self.set_status(e.to_string());
                return Err(e.into());
            }
        }

        if self.settings.persistence.trailing_flush && self.scheduler.due(Instant::now()) {
            let _ = self.save_now();
        }

        Ok(self.session.poll_position())
    }

    pub fn now_playing(&self) -> Option<NowPlaying> {
        let index = self.session.current_index()?;
        let path = self.index.get(index)?;
        Some(NowPlaying {
            index,
            metadata: self.metadata.read(path),
            favorite: self.session.is_favorite(path),
        })
    }

    pub fn state(&self) -> PlaybackState {
        self.session.state()
    }

    // ---------- library commands ----------

    pub fn metadata_of(&self, path: &Path) -> TrackMetadata {
        self.metadata.read(path)
    }

    pub fn search(&self, query: &str) -> Vec<PathBuf> {
        self.index.search(query, self.metadata.as_ref())
    }

    pub fn album_artist(&self, album: &str) -> String {
        self.index.album_artist(album, self.metadata.as_ref())
    }

    /// Add files to the library under their canonical absolute paths.
    /// Returns how many were new.
    pub fn add_tracks<P: AsRef<Path>>(&mut self, paths: &[P]) -> usize {
        let paths: Vec<PathBuf> = paths.iter().map(|p| resolve(p.as_ref())).collect();
        let added = self.index.add(&paths, self.metadata.as_ref());
        if added > 0 {
            self.request_save();
        }
        self.set_status(format!("Added {added} new tracks."));
        added
    }

    /// Add every audio file found below `dir`.
    pub fn add_folder(&mut self, dir: &Path) -> usize {
        let files = collect_audio_files(dir, self.settings.library.follow_links);
        self.add_tracks(&files)
    }

    /// Drop `path` from the library without touching the file. Stops playback
    /// when it is the current track.
    pub fn remove_track(&mut self, path: &Path) -> bool {
        let Some(pos) = self.index.remove(path) else {
            return false;
        };
        self.session.on_track_removed(pos);
        self.request_save();
        true
    }

    /// Move `path` to the trash, then drop it from the library and favorites.
    /// If the trash refuses, the library is left unchanged.
    pub fn delete_track(&mut self, path: &Path) -> AppResult<()> {
        if let Err(e) = self.trash.trash(path) {
            warn!("{e}");
            self.set_status(e.to_string());
            return Err(e.into());
        }
        self.session.remove_favorite(path);
        if !self.remove_track(path) {
            self.request_save();
        }
        self.set_status(format!("Moved {} to the trash.", path.display()));
        Ok(())
    }

    /// Write new tags to `path` and regroup the library.
    pub fn edit_tags(&mut self, path: &Path, edit: &TagEdit) -> AppResult<()> {
        self.metadata.write(path, edit)?;
        self.index.rebuild(self.metadata.as_ref());
        self.request_save();
        Ok(())
    }

    // ---------- scanning ----------

    pub fn is_scanning(&self) -> bool {
        self.scan.is_some()
    }

    /// Start a background scan of `roots` (the configured defaults when
    /// `None`). A running scan is cancelled first; if it does not stop within
    /// `library.cancel_wait_ms` it is abandoned and its results ignored.
    pub fn start_scan(&mut self, roots: Option<Vec<PathBuf>>, deep: bool) {
        if let Some(old) = self.scan.take() {
            let wait = Duration::from_millis(self.settings.library.cancel_wait_ms);
            if !old.cancel_and_wait(wait) {
                warn!("previous scan did not stop within {wait:?}, starting anyway");
            }
        }

        let roots = roots.unwrap_or_else(|| self.settings.scan_roots());
        let options = ScanOptions {
            deep,
            shallow_depth: self.settings.library.shallow_depth,
            follow_links: self.settings.library.follow_links,
        };
        self.set_status("Starting scan...");
        self.scan = Some(ScanHandle::spawn(roots, options));
    }

    pub fn cancel_scan(&mut self) {
        if let Some(scan) = &self.scan {
            scan.cancel();
        }
    }

    /// Drain pending scanner events, merging a finished result into the
    /// library. Returns the drained events for display.
    pub fn poll_scan(&mut self) -> Vec<ScanEvent> {
        let Some(scan) = &self.scan else {
            return Vec::new();
        };
        // Checked before draining so nothing sent before exit is missed.
        let exited = !scan.is_running();
        let events: Vec<ScanEvent> = std::iter::from_fn(|| scan.try_next()).collect();

        for ev in &events {
            match ev {
                ScanEvent::Progress(_) => {}
                ScanEvent::Status(msg) => self.status = msg.clone(),
                ScanEvent::Finished(paths) => {
                    self.scan = None;
                    info!("scan found {} files", paths.len());
                    self.add_tracks(paths);
                }
            }
        }
        if exited {
            self.scan = None;
        }
        events
    }

    /// Stop any scan, stop playback and write the final snapshot.
    pub fn shutdown(mut self) -> Result<(), PersistenceError> {
        if let Some(scan) = self.scan.take() {
            let wait = Duration::from_millis(self.settings.library.cancel_wait_ms);
            scan.cancel_and_wait(wait);
        }
        let result = self.save_now();
        self.session.stop();
        info!("shut down");
        result
    }
}
