use std::path::Path;
use std::time::Duration;

use crate::error::EngineError;

/// The audio output the playback session drives. Implementations decode and
/// play a single file at a time.
pub trait AudioEngine {
    /// Open `path` and prepare it paused at position zero, replacing whatever
    /// was loaded. On error the previous track stays loaded.
    fn load(&mut self, path: &Path) -> Result<(), EngineError>;
    /// Start or resume the loaded track.
    fn play(&mut self);
    fn pause(&mut self);
    /// Stop and unload.
    fn stop(&mut self);
    fn seek(&mut self, position: Duration) -> Result<(), EngineError>;
    /// Normalized volume, 0.0 to 1.0.
    fn set_volume(&mut self, volume: f32);
    /// Elapsed time of the loaded track.
    fn position(&self) -> Duration;
    /// Total length of the loaded track, when the decoder knows it.
    fn duration(&self) -> Option<Duration>;
    /// True exactly once after the loaded track played to its end.
    fn take_finished(&mut self) -> bool;
}
