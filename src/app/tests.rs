use super::*;
use crate::config::Settings;
use crate::error::{AppError, PlaybackError, TrashError};
use crate::library::{ScanEvent, TagEdit};
use crate::library::tests::{FakeTags, touch};
use crate::persist::PersistenceStore;
use crate::playback::PlaybackState;
use crate::playback::tests::FakeEngine;
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::{Duration, Instant};
use tempfile::{TempDir, tempdir};

#[derive(Default)]
struct FakeTrash {
    trashed: RefCell<Vec<PathBuf>>,
    refuse: bool,
}

impl TrashBin for Rc<FakeTrash> {
    fn trash(&self, path: &Path) -> Result<(), TrashError> {
        if self.refuse {
            return Err(TrashError {
                path: path.to_path_buf(),
                reason: "permission denied".into(),
            });
        }
        fs::remove_file(path).map_err(|e| TrashError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        self.trashed.borrow_mut().push(path.to_path_buf());
        Ok(())
    }
}

fn settings(dir: &TempDir, debounce_ms: u64) -> Settings {
    let mut settings = Settings::default();
    settings.persistence.state_path = Some(dir.path().join("state").join("state.json"));
    settings.persistence.debounce_ms = debounce_ms;
    settings
}

struct Harness {
    app: App,
    engine: FakeEngine,
    tags: Rc<FakeTags>,
    trash: Rc<FakeTrash>,
}

fn harness_with(settings: Settings, trash: FakeTrash) -> Harness {
    let engine = FakeEngine::default();
    engine.0.borrow_mut().duration = Some(Duration::from_secs(180));
    let tags = Rc::new(FakeTags::default());
    let trash = Rc::new(trash);
    let app = App::new(
        settings,
        Box::new(engine.clone()),
        Box::new(tags.clone()),
        Box::new(trash.clone()),
    );
    Harness {
        app,
        engine,
        tags,
        trash,
    }
}

fn harness(dir: &TempDir) -> Harness {
    harness_with(settings(dir, 0), FakeTrash::default())
}

fn three_tracks(dir: &TempDir) -> Vec<PathBuf> {
    ["a.mp3", "b.mp3", "c.mp3"]
        .iter()
        .map(|name| fs::canonicalize(touch(dir, name)).unwrap())
        .collect()
}

fn saved(dir: &TempDir) -> crate::persist::PersistedSnapshot {
    PersistenceStore::new(dir.path().join("state").join("state.json"))
        .read_snapshot()
        .unwrap()
        .expect("state file written")
}

#[test]
fn fresh_start_uses_configured_volume() {
    let dir = tempdir().unwrap();
    let mut s = settings(&dir, 0);
    s.playback.volume = 30;
    let h = harness_with(s, FakeTrash::default());

    assert_eq!(h.app.session().volume(), 30);
    assert_eq!(h.app.state(), PlaybackState::NoTrack);
    assert!(h.app.index().is_empty());
}

#[test]
fn adding_tracks_reports_only_new_ones() {
    let dir = tempdir().unwrap();
    let tracks = three_tracks(&dir);
    let mut h = harness(&dir);

    assert_eq!(h.app.add_tracks(&tracks), 3);
    assert_eq!(h.app.add_tracks(&tracks[..1]), 0);
    assert_eq!(h.app.status(), "Added 0 new tracks.");
    assert_eq!(h.app.index().all_tracks(), tracks.as_slice());
}

#[test]
fn relative_and_canonical_paths_index_once() {
    let dir = tempfile::Builder::new().tempdir_in(".").unwrap();
    let canonical = fs::canonicalize(touch(&dir, "song.mp3")).unwrap();
    let relative = Path::new(".")
        .join(dir.path().file_name().unwrap())
        .join("song.mp3");
    assert!(relative.is_relative());
    let mut h = harness(&dir);

    assert_eq!(h.app.add_tracks(&[relative.clone()]), 1);
    assert_eq!(h.app.add_tracks(&[canonical.clone()]), 0);
    assert_eq!(h.app.index().all_tracks(), &[canonical.clone()]);

    let dotted = dir.path().join(".").join("song.mp3");
    assert_eq!(h.app.add_tracks(&[dotted]), 0);
    assert_eq!(saved(&dir).tracks, vec![canonical]);
}

#[cfg(unix)]
#[test]
fn non_utf8_track_does_not_break_saving() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let dir = tempdir().unwrap();
    let tracks = three_tracks(&dir);
    let bad = dir.path().join(OsStr::from_bytes(b"caf\xe9.mp3"));
    fs::write(&bad, b"audio").unwrap();
    let mut h = harness(&dir);

    assert_eq!(h.app.add_tracks(&[tracks[0].clone(), bad]), 1);
    h.app.set_volume(65);
    h.app.shutdown().unwrap();

    let snap = saved(&dir);
    assert_eq!(snap.tracks, vec![tracks[0].clone()]);
    assert_eq!(snap.volume, 65);
}

#[test]
fn add_folder_picks_up_audio_only() {
    let dir = tempdir().unwrap();
    let music = dir.path().join("music");
    fs::create_dir_all(music.join("sub")).unwrap();
    fs::write(music.join("x.mp3"), b"a").unwrap();
    fs::write(music.join("sub").join("y.FLAC"), b"a").unwrap();
    fs::write(music.join("cover.jpg"), b"a").unwrap();
    let mut h = harness(&dir);

    assert_eq!(h.app.add_folder(&music), 2);
}

#[test]
fn state_survives_a_restart() {
    let dir = tempdir().unwrap();
    let tracks = three_tracks(&dir);
    {
        let mut h = harness(&dir);
        h.app.add_tracks(&tracks);
        h.app.play_track(1).unwrap();
        h.app.toggle_favorite().unwrap();
        h.app.toggle_shuffle();
        h.app.set_volume(80);
        h.app.shutdown().unwrap();
    }

    let h = harness(&dir);
    assert_eq!(h.app.index().all_tracks(), tracks.as_slice());
    assert_eq!(h.app.state(), PlaybackState::Paused);
    assert_eq!(h.app.session().current_index(), Some(1));
    assert!(h.app.session().is_shuffled());
    assert_eq!(h.app.session().volume(), 80);

    let now = h.app.now_playing().unwrap();
    assert_eq!(now.index, 1);
    assert!(now.favorite);
    // Restored sessions do not load audio until resumed.
    assert_eq!(h.engine.0.borrow().loads, 0);
}

#[test]
fn resume_after_restart_loads_the_restored_track() {
    let dir = tempdir().unwrap();
    let tracks = three_tracks(&dir);
    {
        let mut h = harness(&dir);
        h.app.add_tracks(&tracks);
        h.app.play_track(2).unwrap();
        h.app.shutdown().unwrap();
    }

    let mut h = harness(&dir);
    h.app.play_pause().unwrap();
    assert_eq!(h.app.state(), PlaybackState::Playing);
    assert_eq!(h.engine.0.borrow().loaded.as_deref(), Some(tracks[2].as_path()));
}

#[test]
fn every_change_is_saved_without_debounce() {
    let dir = tempdir().unwrap();
    let tracks = three_tracks(&dir);
    let mut h = harness(&dir);
    h.app.add_tracks(&tracks);
    h.app.play_track(0).unwrap();
    h.app.next().unwrap();

    let snap = saved(&dir);
    assert_eq!(snap.tracks, tracks);
    assert_eq!(snap.current_path.as_deref(), Some(tracks[1].as_path()));
    assert_eq!(snap.volume, 50);
}

#[test]
fn changes_inside_the_debounce_window_flush_on_shutdown() {
    let dir = tempdir().unwrap();
    let tracks = three_tracks(&dir);
    let mut h = harness_with(settings(&dir, 60_000), FakeTrash::default());

    h.app.add_tracks(&tracks);
    h.app.set_volume(10);
    assert_eq!(saved(&dir).volume, 50);

    // Interval has not passed, so the tick does not write either.
    h.app.tick().unwrap();
    assert_eq!(saved(&dir).volume, 50);

    h.app.shutdown().unwrap();
    assert_eq!(saved(&dir).volume, 10);
}

#[test]
fn remove_current_track_stops_playback() {
    let dir = tempdir().unwrap();
    let tracks = three_tracks(&dir);
    let mut h = harness(&dir);
    h.app.add_tracks(&tracks);
    h.app.play_track(1).unwrap();

    assert!(h.app.remove_track(&tracks[1]));
    assert_eq!(h.app.state(), PlaybackState::NoTrack);
    assert_eq!(h.app.session().current_index(), None);
    assert_eq!(h.engine.0.borrow().stops, 1);
    assert!(tracks[1].exists());
    assert!(!h.app.remove_track(&tracks[1]));
}

#[test]
fn remove_earlier_track_keeps_current_path() {
    let dir = tempdir().unwrap();
    let tracks = three_tracks(&dir);
    let mut h = harness(&dir);
    h.app.add_tracks(&tracks);
    h.app.play_track(2).unwrap();

    h.app.remove_track(&tracks[0]);
    assert_eq!(h.app.session().current_index(), Some(1));
    assert_eq!(h.app.state(), PlaybackState::Playing);
    assert_eq!(
        h.app.session().current_path(h.app.index().all_tracks()),
        Some(tracks[2].as_path())
    );
}

#[test]
fn delete_track_trashes_and_forgets_it() {
    let dir = tempdir().unwrap();
    let tracks = three_tracks(&dir);
    let mut h = harness(&dir);
    h.app.add_tracks(&tracks);
    h.app.play_track(0).unwrap();
    h.app.toggle_favorite().unwrap();

    h.app.delete_track(&tracks[0]).unwrap();

    assert!(!tracks[0].exists());
    assert_eq!(*h.trash.trashed.borrow(), vec![tracks[0].clone()]);
    assert!(!h.app.index().contains(&tracks[0]));
    assert!(h.app.session().favorites().is_empty());
    assert_eq!(h.app.state(), PlaybackState::NoTrack);
}

#[test]
fn refused_delete_leaves_library_unchanged() {
    let dir = tempdir().unwrap();
    let tracks = three_tracks(&dir);
    let trash = FakeTrash {
        refuse: true,
        ..FakeTrash::default()
    };
    let mut h = harness_with(settings(&dir, 0), trash);
    h.app.add_tracks(&tracks);

    let err = h.app.delete_track(&tracks[1]).unwrap_err();
    assert!(matches!(err, AppError::Trash(_)));
    assert_eq!(h.app.index().len(), 3);
    assert!(tracks[1].exists());
}

#[test]
fn edit_tags_regroups_the_library() {
    let dir = tempdir().unwrap();
    let tracks = three_tracks(&dir);
    let mut h = harness(&dir);
    for t in &tracks {
        h.tags.set(t, "First", "Band");
    }
    h.app.add_tracks(&tracks);
    assert_eq!(h.app.index().tracks_in_album("First").len(), 3);

    let edit = TagEdit {
        title: "b".into(),
        artists: vec!["Band".into(), "Guest".into()],
        album: "Second".into(),
        ..TagEdit::default()
    };
    h.app.edit_tags(&tracks[1], &edit).unwrap();

    assert_eq!(h.app.index().tracks_in_album("First").len(), 2);
    assert_eq!(h.app.index().tracks_in_album("Second"), &tracks[1..2]);
    assert_eq!(h.app.index().tracks_by_artist("Guest"), &tracks[1..2]);
    assert_eq!(h.app.metadata_of(&tracks[1]).album, "Second");
}

#[test]
fn search_goes_through_metadata() {
    let dir = tempdir().unwrap();
    let tracks = three_tracks(&dir);
    let mut h = harness(&dir);
    h.tags.set(&tracks[0], "Blue", "Miles");
    h.tags.set(&tracks[1], "Red", "Someone");
    h.app.add_tracks(&tracks);

    assert_eq!(h.app.search("MILES"), vec![tracks[0].clone()]);
    assert_eq!(h.app.album_artist("Red"), "Someone");
}

#[test]
fn missing_file_is_reported_and_state_kept() {
    let dir = tempdir().unwrap();
    let tracks = three_tracks(&dir);
    let mut h = harness(&dir);
    h.app.add_tracks(&tracks);
    h.app.play_track(0).unwrap();
    fs::remove_file(&tracks[1]).unwrap();

    let err = h.app.next().unwrap_err();
    assert!(matches!(err, AppError::Playback(PlaybackError::NotFound(_))));
    assert_eq!(h.app.session().current_index(), Some(0));
    assert_eq!(h.app.state(), PlaybackState::Playing);
}

#[test]
fn tick_advances_at_end_of_track() {
    let dir = tempdir().unwrap();
    let tracks = three_tracks(&dir);
    let mut h = harness(&dir);
    h.app.add_tracks(&tracks);
    h.app.play_track(2).unwrap();

    h.engine.0.borrow_mut().position = Duration::from_secs(90);
    assert_eq!(h.app.tick().unwrap(), Some(0.5));

    h.engine.0.borrow_mut().finished = true;
    h.app.tick().unwrap();
    assert_eq!(h.app.session().current_index(), Some(0));
    assert_eq!(saved(&dir).current_path.as_deref(), Some(tracks[0].as_path()));
}

#[test]
fn scan_results_are_merged_into_the_library() {
    let dir = tempdir().unwrap();
    let music = dir.path().join("music");
    fs::create_dir_all(music.join("deep").join("er")).unwrap();
    fs::write(music.join("one.mp3"), b"a").unwrap();
    fs::write(music.join("deep").join("er").join("two.wav"), b"a").unwrap();
    fs::write(music.join("readme.txt"), b"a").unwrap();
    let mut h = harness(&dir);

    h.app.start_scan(Some(vec![music.clone()]), true);
    let deadline = Instant::now() + Duration::from_secs(10);
    let mut events = Vec::new();
    while h.app.is_scanning() && Instant::now() < deadline {
        events.extend(h.app.poll_scan());
        std::thread::sleep(Duration::from_millis(5));
    }

    assert!(!h.app.is_scanning());
    assert!(matches!(events.last(), Some(ScanEvent::Finished(found)) if found.len() == 2));
    assert_eq!(h.app.index().len(), 2);
    assert!(h.app.index().contains(&fs::canonicalize(music.join("one.mp3")).unwrap()));
}

#[test]
fn restarting_a_scan_replaces_the_previous_one() {
    let dir = tempdir().unwrap();
    let music = dir.path().join("music");
    fs::create_dir_all(&music).unwrap();
    fs::write(music.join("one.mp3"), b"a").unwrap();
    let mut h = harness(&dir);

    h.app.start_scan(Some(vec![music.clone()]), false);
    h.app.start_scan(Some(vec![music.clone()]), false);
    let deadline = Instant::now() + Duration::from_secs(10);
    while h.app.is_scanning() && Instant::now() < deadline {
        h.app.poll_scan();
        std::thread::sleep(Duration::from_millis(5));
    }

    assert_eq!(h.app.index().len(), 1);
}
