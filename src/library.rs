//! Library module: track discovery, metadata and the in-memory index.
//!
//! `scan` walks directories on a background thread, `metadata` reads and
//! writes tag containers, and `index` keeps the track list with its album and
//! artist groupings.

mod display;
mod index;
mod metadata;
mod model;
mod scan;

pub use display::display_line;
pub use index::LibraryIndex;
pub use metadata::{LoftyMetadata, MetadataSource, parse_artists};
pub use model::*;
pub use scan::{
    AUDIO_EXTENSIONS, ScanEvent, ScanHandle, ScanOptions, collect_audio_files, is_audio_file,
    resolve, scan_roots,
};

#[cfg(test)]
pub(crate) mod tests;
