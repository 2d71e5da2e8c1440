use std::time::{Duration, Instant};

/// Leading-edge save debouncer with a dirty flag.
///
/// `request` says whether a save should run now; requests inside the interval
/// only mark the state dirty. `due` reports a pending dirty state whose
/// interval has passed, for a trailing save.
#[derive(Debug, Clone)]
pub struct SaveScheduler {
    interval: Duration,
    last_saved: Option<Instant>,
    dirty: bool,
}

impl SaveScheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_saved: None,
            dirty: false,
        }
    }

    fn window_passed(&self, now: Instant) -> bool {
        self.last_saved
            .is_none_or(|last| now.saturating_duration_since(last) >= self.interval)
    }

    /// Register a change. Returns true when the caller should save now.
    pub fn request(&mut self, now: Instant) -> bool {
        self.dirty = true;
        self.window_passed(now)
    }

    /// A change is pending and the interval since the last save has passed.
    pub fn due(&self, now: Instant) -> bool {
        self.dirty && self.window_passed(now)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Record an executed save.
    pub fn mark_saved(&mut self, now: Instant) {
        self.last_saved = Some(now);
        self.dirty = false;
    }
}
