//! Playback: the session state machine and the audio engine it drives.
//!
//! `session` holds the state machine (`NoTrack`/`Paused`/`Playing`, shuffle,
//! volume, favorites), `engine` defines the audio output boundary and `sink`
//! implements it on top of `rodio`.

mod engine;
mod session;
mod sink;
mod types;

pub use engine::AudioEngine;
pub use session::PlaybackSession;
pub use sink::RodioEngine;
pub use types::*;
