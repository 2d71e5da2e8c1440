use super::*;
use crate::error::MetadataWriteError;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{TempDir, tempdir};

/// In-memory tag container keyed by path.
#[derive(Default)]
pub(crate) struct FakeTags {
    pub(crate) tags: RefCell<HashMap<PathBuf, TrackMetadata>>,
}

impl FakeTags {
    pub(crate) fn set(&self, path: &Path, album: &str, artists: &str) {
        let mut meta = TrackMetadata::fallback(path);
        meta.album = album.to_string();
        meta.artists = parse_artists(artists);
        meta.title = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.tags.borrow_mut().insert(path.to_path_buf(), meta);
    }
}

impl MetadataSource for FakeTags {
    fn read(&self, path: &Path) -> TrackMetadata {
        self.tags
            .borrow()
            .get(path)
            .cloned()
            .unwrap_or_else(|| TrackMetadata::fallback(path))
    }

    fn write(&self, path: &Path, edit: &TagEdit) -> Result<(), MetadataWriteError> {
        let mut tags = self.tags.borrow_mut();
        let meta = tags
            .entry(path.to_path_buf())
            .or_insert_with(|| TrackMetadata::fallback(path));
        meta.title = edit.title.clone();
        meta.artists = edit.artists.clone();
        meta.album = edit.album.clone();
        meta.year = edit.year.clone();
        if edit.cover.is_some() {
            meta.cover = edit.cover.clone();
        }
        Ok(())
    }
}

impl MetadataSource for std::rc::Rc<FakeTags> {
    fn read(&self, path: &Path) -> TrackMetadata {
        (**self).read(path)
    }

    fn write(&self, path: &Path, edit: &TagEdit) -> Result<(), MetadataWriteError> {
        (**self).write(path, edit)
    }
}

pub(crate) fn touch(dir: &TempDir, name: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, b"audio").unwrap();
    path
}

fn abc() -> (TempDir, FakeTags, PathBuf, PathBuf, PathBuf) {
    let dir = tempdir().unwrap();
    let tags = FakeTags::default();
    let a = touch(&dir, "A.mp3");
    let b = touch(&dir, "B.mp3");
    let c = touch(&dir, "C.mp3");
    tags.set(&a, "X", "P");
    tags.set(&b, "X", "Q");
    tags.set(&c, "Y", "P");
    (dir, tags, a, b, c)
}

#[test]
fn add_groups_tracks_by_album_and_artist() {
    let (_dir, tags, a, b, c) = abc();
    let mut index = LibraryIndex::new();

    assert_eq!(index.add(&[&a, &b, &c], &tags), 3);

    assert_eq!(index.all_tracks(), &[a.clone(), b.clone(), c.clone()]);
    assert_eq!(index.tracks_in_album("X"), &[a.clone(), b.clone()]);
    assert_eq!(index.tracks_in_album("Y"), &[c.clone()]);
    assert_eq!(index.tracks_by_artist("P"), &[a.clone(), c.clone()]);
    assert_eq!(index.tracks_by_artist("Q"), &[b.clone()]);
    assert_eq!(index.album_names().collect::<Vec<_>>(), vec!["X", "Y"]);
    assert_eq!(index.artist_names().collect::<Vec<_>>(), vec!["P", "Q"]);
}

#[test]
fn add_is_idempotent_and_skips_missing_files() {
    let (dir, tags, a, _b, _c) = abc();
    let mut index = LibraryIndex::new();

    assert_eq!(index.add(&[&a], &tags), 1);
    assert_eq!(index.add(&[&a, &a], &tags), 0);
    assert_eq!(index.add(&[dir.path().join("gone.mp3")], &tags), 0);

    assert_eq!(index.len(), 1);
    assert_eq!(index.tracks_in_album("X"), &[a.clone()]);
    assert_eq!(index.tracks_by_artist("P"), &[a]);
}

#[test]
fn add_preserves_discovery_order() {
    let (_dir, tags, a, b, c) = abc();
    let mut index = LibraryIndex::new();
    index.add(&[&c, &a, &b], &tags);
    assert_eq!(index.all_tracks(), &[c, a, b]);
}

#[test]
fn multi_artist_track_lands_in_every_artist_bucket() {
    let dir = tempdir().unwrap();
    let tags = FakeTags::default();
    let duet = touch(&dir, "duet.flac");
    tags.set(&duet, "Duets", "P; Q, R");

    let mut index = LibraryIndex::new();
    index.add(&[&duet], &tags);
    for artist in ["P", "Q", "R"] {
        assert_eq!(index.tracks_by_artist(artist), &[duet.clone()]);
    }
}

#[test]
fn untagged_track_is_classified_under_unknowns() {
    let dir = tempdir().unwrap();
    let tags = FakeTags::default();
    let bare = touch(&dir, "bare.wav");

    let mut index = LibraryIndex::new();
    index.add(&[&bare], &tags);
    assert_eq!(index.tracks_in_album(UNKNOWN_ALBUM), &[bare.clone()]);
    assert_eq!(index.tracks_by_artist(UNKNOWN_ARTIST), &[bare]);
}

#[test]
fn remove_clears_buckets_and_drops_empty_ones() {
    let (_dir, tags, a, b, c) = abc();
    let mut index = LibraryIndex::new();
    index.add(&[&a, &b, &c], &tags);

    assert_eq!(index.remove(&c), Some(2));
    assert!(!index.contains(&c));
    assert!(index.tracks_in_album("Y").is_empty());
    assert_eq!(index.album_names().collect::<Vec<_>>(), vec!["X"]);
    assert_eq!(index.tracks_by_artist("P"), &[a.clone()]);

    assert_eq!(index.remove(&b), Some(1));
    assert_eq!(index.artist_names().collect::<Vec<_>>(), vec!["P"]);
    assert_eq!(index.remove(&b), None);
}

#[test]
fn rebuild_reflects_edited_tags() {
    let (_dir, tags, a, b, c) = abc();
    let mut index = LibraryIndex::new();
    index.add(&[&a, &b, &c], &tags);

    tags.set(&b, "Y", "P");
    index.rebuild(&tags);

    assert_eq!(index.tracks_in_album("X"), &[a.clone()]);
    assert_eq!(index.tracks_in_album("Y"), &[b.clone(), c.clone()]);
    assert_eq!(index.tracks_by_artist("P"), &[a, b, c]);
    assert!(index.tracks_by_artist("Q").is_empty());
    assert_eq!(index.artist_names().count(), 1);
}

#[test]
fn search_matches_title_artist_and_album() {
    let (_dir, tags, a, b, c) = abc();
    let mut index = LibraryIndex::new();
    index.add(&[&a, &b, &c], &tags);

    assert_eq!(index.search("q", &tags), vec![b.clone()]);
    assert_eq!(index.search(" y ", &tags), vec![c.clone()]);
    assert_eq!(index.search("", &tags), vec![a, b, c]);
    assert!(index.search("nothing-like-this", &tags).is_empty());
}

#[test]
fn album_artist_is_first_artist_of_first_track() {
    let (_dir, tags, a, b, c) = abc();
    let mut index = LibraryIndex::new();
    index.add(&[&b, &a, &c], &tags);

    assert_eq!(index.album_artist("X", &tags), "Q");
    assert_eq!(index.album_artist("Nope", &tags), UNKNOWN_ARTIST);
}

#[test]
fn display_line_joins_artists() {
    assert_eq!(
        display_line("Song", &["A".to_string(), "B".to_string()]),
        "A, B - Song"
    );
    assert_eq!(display_line("Song", &[]), "Song");
    assert_eq!(display_line(" Song ", &["  ".to_string()]), "Song");
}
