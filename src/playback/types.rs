//! Small playback types shared by the session and its front ends.

use std::time::Duration;

/// The playback state of the session.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum PlaybackState {
    /// No current track.
    #[default]
    NoTrack,
    /// A current track is selected but not playing.
    Paused,
    /// The current track is playing.
    Playing,
}

/// Volume bounds, in percent.
pub const MIN_VOLUME: u8 = 0;
pub const MAX_VOLUME: u8 = 100;

/// Default `prev` restart threshold.
pub const RESTART_THRESHOLD: Duration = Duration::from_secs(10);

pub fn clamp_volume(v: i32) -> u8 {
    v.clamp(MIN_VOLUME as i32, MAX_VOLUME as i32) as u8
}
