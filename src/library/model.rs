use std::path::Path;

pub const UNKNOWN_ARTIST: &str = "Unknown Artist";
pub const UNKNOWN_ALBUM: &str = "Unknown Album";

/// Metadata derived from one audio file. Every field carries an explicit
/// default, so callers never deal with missing keys.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackMetadata {
    pub title: String,
    pub artists: Vec<String>,
    pub album: String,
    pub year: String,
    pub cover: Option<Vec<u8>>,
    pub duration_secs: f64,
}

impl TrackMetadata {
    /// The record used when a file has no readable tags.
    pub fn fallback(path: &Path) -> Self {
        let title = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Self {
            title,
            artists: vec![UNKNOWN_ARTIST.to_string()],
            album: UNKNOWN_ALBUM.to_string(),
            year: String::new(),
            cover: None,
            duration_secs: 0.0,
        }
    }

    pub fn display(&self) -> String {
        super::display::display_line(&self.title, &self.artists)
    }
}

/// New values for the editable fields of a track's tag container.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagEdit {
    pub title: String,
    pub artists: Vec<String>,
    pub album: String,
    pub year: String,
    /// Replacement cover image (JPEG/PNG bytes). `None` keeps the current one.
    pub cover: Option<Vec<u8>>,
}

/// What the front end shows for the current track.
#[derive(Debug, Clone, PartialEq)]
pub struct NowPlaying {
    pub index: usize,
    pub metadata: TrackMetadata,
    pub favorite: bool,
}
