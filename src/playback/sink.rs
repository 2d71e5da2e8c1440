//! `rodio`-backed [`AudioEngine`].
//!
//! One paused `Sink` is created per loaded track; end of track is detected by
//! polling `Sink::empty`.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink, Source};

use crate::error::EngineError;

use super::engine::AudioEngine;

pub struct RodioEngine {
    stream: OutputStream,
    sink: Option<Sink>,
    duration: Option<Duration>,
    volume: f32,
    finished_reported: bool,
}

impl RodioEngine {
    /// Open the default output device.
    pub fn open_default() -> Result<Self, EngineError> {
        let mut stream = OutputStreamBuilder::open_default_stream()
            .map_err(|e| EngineError::Output(e.to_string()))?;
        // rodio logs to stderr when OutputStream is dropped.
        stream.log_on_drop(false);

        Ok(Self {
            stream,
            sink: None,
            duration: None,
            volume: 0.5,
            finished_reported: false,
        })
    }
}

/// Create a paused `Sink` for `path`.
fn create_sink(
    stream: &OutputStream,
    path: &Path,
) -> Result<(Sink, Option<Duration>), EngineError> {
    let file = File::open(path).map_err(|source| EngineError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let source = Decoder::new(BufReader::new(file)).map_err(|e| EngineError::Decode {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let duration = source.total_duration();

    let sink = Sink::connect_new(stream.mixer());
    sink.pause();
    sink.append(source);
    Ok((sink, duration))
}

impl AudioEngine for RodioEngine {
    fn load(&mut self, path: &Path) -> Result<(), EngineError> {
        let (sink, duration) = create_sink(&self.stream, path)?;
        sink.set_volume(self.volume);

        if let Some(old) = self.sink.take() {
            old.stop();
        }
        self.sink = Some(sink);
        self.duration = duration;
        self.finished_reported = false;
        Ok(())
    }

    fn play(&mut self) {
        if let Some(sink) = &self.sink {
            sink.play();
        }
    }

    fn pause(&mut self) {
        if let Some(sink) = &self.sink {
            sink.pause();
        }
    }

    fn stop(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
        self.duration = None;
    }

    fn seek(&mut self, position: Duration) -> Result<(), EngineError> {
        let sink = self.sink.as_ref().ok_or(EngineError::NotLoaded)?;
        sink.try_seek(position)
            .map_err(|e| EngineError::Seek(e.to_string()))?;
        self.finished_reported = false;
        Ok(())
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        if let Some(sink) = &self.sink {
            sink.set_volume(self.volume);
        }
    }

    fn position(&self) -> Duration {
        self.sink.as_ref().map_or(Duration::ZERO, Sink::get_pos)
    }

    fn duration(&self) -> Option<Duration> {
        self.duration
    }

    fn take_finished(&mut self) -> bool {
        let finished = self.sink.as_ref().is_some_and(Sink::empty);
        if finished && !self.finished_reported {
            self.finished_reported = true;
            return true;
        }
        false
    }
}
