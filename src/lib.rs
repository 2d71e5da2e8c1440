//! medley: a local audio library manager and playback session controller.
//!
//! The crate is organized around one owned [`app::App`] value. It discovers
//! audio files (`library::scan`), reads and writes their tags
//! (`library::metadata`), keeps an album/artist index, drives a single-track
//! playback session over a `rodio` output, and persists everything to a JSON
//! state file between runs.

pub mod app;
pub mod config;
pub mod error;
pub mod library;
pub mod persist;
pub mod playback;
