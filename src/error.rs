//! Error types surfaced by the library, playback and persistence layers.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("cannot play {}: {reason}", path.display())]
    UnsupportedAudio { path: PathBuf, reason: String },

    #[error("no track is selected")]
    NoTrack,

    #[error("track index {index} is out of range (library has {len} tracks)")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Failure reported by an [`AudioEngine`](crate::playback::AudioEngine).
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("audio output unavailable: {0}")]
    Output(String),

    #[error("failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode {}: {reason}", path.display())]
    Decode { path: PathBuf, reason: String },

    #[error("seek failed: {0}")]
    Seek(String),

    #[error("nothing is loaded")]
    NotLoaded,
}

#[derive(Debug, Error)]
pub enum MetadataWriteError {
    #[error("cannot read tags of {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: lofty::error::LoftyError,
    },

    #[error("{} has no tag container that can be written", .0.display())]
    NoTag(PathBuf),

    #[error("cannot read cover image: {0}")]
    Cover(String),

    #[error("cannot write tags to {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: lofty::error::LoftyError,
    },
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("state file i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("state file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
#[error("could not move {} to the trash: {reason}", path.display())]
pub struct TrashError {
    pub path: PathBuf,
    pub reason: String,
}

/// Everything a command on [`App`](crate::app::App) can report to the user.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Playback(#[from] PlaybackError),

    #[error(transparent)]
    MetadataWrite(#[from] MetadataWriteError),

    #[error(transparent)]
    Trash(#[from] TrashError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

pub type AppResult<T> = Result<T, AppError>;
