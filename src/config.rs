//! Configuration loader and schema types.
//!
//! This module exposes the configuration schema used to drive the library
//! scanner, playback session and persistence, plus helpers to load it from disk.

mod load;
mod schema;

pub use load::{default_config_path, default_state_path, home_dir, resolve_config_path};
pub use schema::*;
