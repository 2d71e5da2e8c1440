use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use log::debug;

use super::display::matches_query;
use super::metadata::MetadataSource;
use super::model::{UNKNOWN_ALBUM, UNKNOWN_ARTIST};

/// The canonical track list plus album and artist groupings derived from each
/// track's last extracted metadata.
///
/// Between operations every path in a bucket is also in `tracks`, and no
/// bucket is empty.
#[derive(Debug, Default, Clone)]
pub struct LibraryIndex {
    tracks: Vec<PathBuf>,
    albums: BTreeMap<String, Vec<PathBuf>>,
    artists: BTreeMap<String, Vec<PathBuf>>,
}

fn push_unique(bucket: &mut Vec<PathBuf>, path: &Path) {
    if bucket.last().map(PathBuf::as_path) != Some(path) {
        bucket.push(path.to_path_buf());
    }
}

impl LibraryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index over `tracks` as given (e.g. restored from disk), then
    /// classify them.
    pub fn from_tracks(tracks: Vec<PathBuf>, source: &dyn MetadataSource) -> Self {
        let mut index = Self::default();
        for path in tracks {
            if !index.contains(&path) {
                index.tracks.push(path);
            }
        }
        index.rebuild(source);
        index
    }

    fn classify(&mut self, path: &Path, source: &dyn MetadataSource) {
        let meta = source.read(path);

        let album = if meta.album.trim().is_empty() {
            UNKNOWN_ALBUM.to_string()
        } else {
            meta.album
        };
        push_unique(self.albums.entry(album).or_default(), path);

        let mut artists = meta.artists;
        artists.retain(|a| !a.trim().is_empty());
        if artists.is_empty() {
            artists.push(UNKNOWN_ARTIST.to_string());
        }
        for artist in artists {
            push_unique(self.artists.entry(artist).or_default(), path);
        }
    }

    /// Append every path that is not yet indexed and exists on disk. Paths
    /// that are not valid UTF-8 are skipped. Returns how many were added.
    pub fn add<P: AsRef<Path>>(&mut self, paths: &[P], source: &dyn MetadataSource) -> usize {
        let mut added = 0;
        for path in paths {
            let path = path.as_ref();
            if self.contains(path) || !path.exists() {
                continue;
            }
            if path.to_str().is_none() {
                debug!("skipping non UTF-8 path {}", path.display());
                continue;
            }
            self.tracks.push(path.to_path_buf());
            self.classify(path, source);
            added += 1;
        }
        added
    }

    /// Drop `path` from the track list and every bucket. Returns its former
    /// position, if it was indexed.
    pub fn remove(&mut self, path: &Path) -> Option<usize> {
        let pos = self.position(path)?;
        self.tracks.remove(pos);

        for buckets in [&mut self.albums, &mut self.artists] {
            buckets.retain(|_, members| {
                members.retain(|p| p != path);
                !members.is_empty()
            });
        }
        Some(pos)
    }

    /// Recompute every bucket from the current track list.
    pub fn rebuild(&mut self, source: &dyn MetadataSource) {
        self.albums.clear();
        self.artists.clear();
        let tracks = self.tracks.clone();
        for path in &tracks {
            self.classify(path, source);
        }
    }

    pub fn all_tracks(&self) -> &[PathBuf] {
        &self.tracks
    }

    pub fn tracks_in_album(&self, name: &str) -> &[PathBuf] {
        self.albums.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn tracks_by_artist(&self, name: &str) -> &[PathBuf] {
        self.artists.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn album_names(&self) -> impl Iterator<Item = &str> {
        self.albums.keys().map(String::as_str)
    }

    pub fn artist_names(&self) -> impl Iterator<Item = &str> {
        self.artists.keys().map(String::as_str)
    }

    /// First artist of the first track in `album`.
    pub fn album_artist(&self, album: &str, source: &dyn MetadataSource) -> String {
        self.tracks_in_album(album)
            .first()
            .and_then(|p| source.read(p).artists.into_iter().next())
            .unwrap_or_else(|| UNKNOWN_ARTIST.to_string())
    }

    /// Tracks whose title, artists or album contain `query` (case-insensitive),
    /// in library order.
    pub fn search(&self, query: &str, source: &dyn MetadataSource) -> Vec<PathBuf> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return self.tracks.clone();
        }
        self.tracks
            .iter()
            .filter(|p| matches_query(&source.read(p), &query))
            .cloned()
            .collect()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.tracks.iter().any(|p| p == path)
    }

    pub fn position(&self, path: &Path) -> Option<usize> {
        self.tracks.iter().position(|p| p == path)
    }

    pub fn get(&self, index: usize) -> Option<&Path> {
        self.tracks.get(index).map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}
