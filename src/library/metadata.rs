//! Reading and writing the metadata embedded in audio files.
//!
//! [`MetadataSource`] is the seam between the library and the tag container.
//! Reads never fail: anything that cannot be parsed resolves to the defaults in
//! [`TrackMetadata::fallback`]. Writes report their failures to the caller.

use std::io::Cursor;
use std::path::Path;

use lofty::config::WriteOptions;
use lofty::file::{AudioFile, TaggedFile, TaggedFileExt};
use lofty::picture::{Picture, PictureType};
use lofty::tag::{Accessor, ItemKey, Tag};
use log::debug;

use crate::error::MetadataWriteError;

use super::model::{TagEdit, TrackMetadata, UNKNOWN_ALBUM, UNKNOWN_ARTIST};

pub trait MetadataSource {
    /// Extract metadata for `path`, falling back to defaults field by field.
    fn read(&self, path: &Path) -> TrackMetadata;

    /// Replace the editable fields of `path`'s tag container.
    fn write(&self, path: &Path, edit: &TagEdit) -> Result<(), MetadataWriteError>;
}

/// Split a raw artist field on `;` and `,`, trimming each name and dropping
/// empty segments. Order is preserved and duplicates are kept.
pub fn parse_artists(raw: &str) -> Vec<String> {
    raw.replace(';', ",")
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn non_blank(v: Option<&str>) -> Option<String> {
    v.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

/// [`MetadataSource`] backed by `lofty`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoftyMetadata;

impl LoftyMetadata {
    fn cover_of(tag: &Tag) -> Option<Vec<u8>> {
        let pictures = tag.pictures();
        pictures
            .iter()
            .find(|p| p.pic_type() == PictureType::CoverFront)
            .or_else(|| pictures.first())
            .map(|p| p.data().to_vec())
    }

    fn fill_from_tag(meta: &mut TrackMetadata, tag: &Tag) {
        if let Some(title) = non_blank(tag.title().as_deref()) {
            meta.title = title;
        }

        let raw_artists: Vec<&str> = tag.get_strings(&ItemKey::TrackArtist).collect();
        let artists = parse_artists(&raw_artists.join(","));
        if !artists.is_empty() {
            meta.artists = artists;
        }

        if let Some(album) = non_blank(tag.album().as_deref()) {
            meta.album = album;
        }

        if let Some(year) = non_blank(tag.get_string(&ItemKey::Year))
            .or_else(|| non_blank(tag.get_string(&ItemKey::RecordingDate)))
        {
            meta.year = year;
        }

        meta.cover = Self::cover_of(tag);
    }

    fn writable_tag(tagged: &mut TaggedFile) -> Option<&mut Tag> {
        if tagged.primary_tag().is_none() && tagged.first_tag().is_none() {
            let tag_type = tagged.primary_tag_type();
            tagged.insert_tag(Tag::new(tag_type));
        }
        if tagged.primary_tag().is_some() {
            tagged.primary_tag_mut()
        } else {
            tagged.first_tag_mut()
        }
    }
}

impl MetadataSource for LoftyMetadata {
    fn read(&self, path: &Path) -> TrackMetadata {
        let mut meta = TrackMetadata::fallback(path);

        let tagged = match lofty::read_from_path(path) {
            Ok(t) => t,
            Err(e) => {
                debug!("no readable tags in {}: {e}", path.display());
                return meta;
            }
        };

        meta.duration_secs = tagged.properties().duration().as_secs_f64();

        if let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) {
            Self::fill_from_tag(&mut meta, tag);
        }

        meta
    }

    fn write(&self, path: &Path, edit: &TagEdit) -> Result<(), MetadataWriteError> {
        let mut tagged = lofty::read_from_path(path).map_err(|source| MetadataWriteError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        let cover = match &edit.cover {
            Some(bytes) => {
                let mut picture = Picture::from_reader(&mut Cursor::new(bytes.as_slice()))
                    .map_err(|e| MetadataWriteError::Cover(e.to_string()))?;
                picture.set_pic_type(PictureType::CoverFront);
                Some(picture)
            }
            None => None,
        };

        let tag = Self::writable_tag(&mut tagged)
            .ok_or_else(|| MetadataWriteError::NoTag(path.to_path_buf()))?;

        tag.set_title(edit.title.trim().to_string());

        let artists: Vec<&str> = edit
            .artists
            .iter()
            .map(|a| a.trim())
            .filter(|a| !a.is_empty())
            .collect();
        if artists.is_empty() {
            tag.remove_artist();
        } else {
            tag.set_artist(artists.join("; "));
        }

        tag.set_album(edit.album.trim().to_string());

        let year = edit.year.trim();
        if year.is_empty() {
            tag.remove_key(&ItemKey::Year);
        } else {
            tag.insert_text(ItemKey::Year, year.to_string());
        }

        if let Some(picture) = cover {
            while !tag.pictures().is_empty() {
                tag.remove_picture(0);
            }
            tag.push_picture(picture);
        }

        tagged
            .save_to_path(path, WriteOptions::default())
            .map_err(|source| MetadataWriteError::Write {
                path: path.to_path_buf(),
                source,
            })
    }
}
