use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{debug, info};
use walkdir::WalkDir;

/// Extensions (lowercase, without dot) that the scanner treats as audio.
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "m4a", "flac", "wav"];

/// Messages sent from the scanner thread to its owner.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanEvent {
    /// Completed roots / total roots, as an integer percentage.
    Progress(u8),
    /// Human-readable status line.
    Status(String),
    /// Terminal result: sorted, deduplicated absolute paths.
    Finished(Vec<PathBuf>),
}

#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Unlimited recursion when true; otherwise capped at `shallow_depth`.
    pub deep: bool,
    pub shallow_depth: usize,
    pub follow_links: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            deep: false,
            shallow_depth: 5,
            follow_links: true,
        }
    }
}

/// Whether `path` has an audio extension. Paths that are not valid UTF-8 are
/// rejected since the state file stores paths as JSON strings.
pub fn is_audio_file(path: &Path) -> bool {
    if path.to_str().is_none() {
        return false;
    }
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            AUDIO_EXTENSIONS.iter().any(|e| *e == ext)
        })
        .unwrap_or(false)
}

/// Resolve `path` to a canonical absolute path so that the same file reached
/// through a symlink or a relative path compares equal.
pub fn resolve(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .map(|cwd| cwd.join(path))
                .unwrap_or_else(|_| path.to_path_buf())
        }
    })
}

fn walker(root: &Path, options: &ScanOptions) -> WalkDir {
    let mut walker = WalkDir::new(root).follow_links(options.follow_links);
    if !options.deep {
        // WalkDir counts the root as depth 0, so files directly under it are depth 1.
        walker = walker.max_depth(options.shallow_depth.saturating_add(1));
    }
    walker
}

/// Append every audio file under `root` to `found`. Returns `false` when the
/// walk stopped early because `cancel` was raised.
fn walk_root(
    root: &Path,
    options: &ScanOptions,
    cancel: &AtomicBool,
    found: &mut Vec<PathBuf>,
) -> bool {
    for entry in walker(root, options).into_iter() {
        if cancel.load(Ordering::Relaxed) {
            return false;
        }
        let entry = match entry {
            Ok(e) => e,
            Err(err) => {
                debug!("skipping unreadable entry under {}: {err}", root.display());
                continue;
            }
        };
        let path = entry.path();
        if entry.file_type().is_dir() {
            continue;
        }
        if is_audio_file(path) && path.is_file() {
            found.push(resolve(path));
        }
    }
    true
}

fn sort_unique(mut paths: Vec<PathBuf>) -> Vec<PathBuf> {
    paths.sort();
    paths.dedup();
    paths
}

/// Scan `roots` in order, reporting through `emit`. Always ends with exactly
/// one [`ScanEvent::Finished`], even when cancelled.
pub fn scan_roots(
    roots: &[PathBuf],
    options: &ScanOptions,
    cancel: &AtomicBool,
    mut emit: impl FnMut(ScanEvent),
) {
    let total = roots.len().max(1);
    let mut found: Vec<PathBuf> = Vec::new();
    let mut cancelled = false;

    for (done, root) in roots.iter().enumerate() {
        if cancel.load(Ordering::Relaxed) {
            cancelled = true;
            break;
        }
        emit(ScanEvent::Status(format!("Scanning: {}", root.display())));

        // A root cut short by cancellation does not count as completed.
        if root.exists() && !walk_root(root, options, cancel, &mut found) {
            cancelled = true;
            break;
        }

        let percent = ((done + 1) * 100 / total) as u8;
        emit(ScanEvent::Progress(percent));
    }

    let found = sort_unique(found);
    if cancelled {
        info!("scan cancelled with {} files collected", found.len());
        emit(ScanEvent::Status("Scan cancelled.".to_string()));
    } else {
        info!("scan finished: {} files", found.len());
        emit(ScanEvent::Status("Scan finished.".to_string()));
    }
    emit(ScanEvent::Finished(found));
}

/// Synchronously collect every audio file below `dir` (no depth cap).
pub fn collect_audio_files(dir: &Path, follow_links: bool) -> Vec<PathBuf> {
    let options = ScanOptions {
        deep: true,
        follow_links,
        ..ScanOptions::default()
    };
    let mut found = Vec::new();
    walk_root(dir, &options, &AtomicBool::new(false), &mut found);
    sort_unique(found)
}

/// Handle to a scan running on a background thread.
pub struct ScanHandle {
    rx: Receiver<ScanEvent>,
    cancel: Arc<AtomicBool>,
    join: Option<JoinHandle<()>>,
}

impl ScanHandle {
    /// Start scanning `roots` on a new thread.
    pub fn spawn(roots: Vec<PathBuf>, options: ScanOptions) -> Self {
        let (tx, rx) = mpsc::channel::<ScanEvent>();
        let cancel = Arc::new(AtomicBool::new(false));
        let worker_cancel = cancel.clone();

        let join = thread::spawn(move || run_worker(roots, options, worker_cancel, tx));

        Self {
            rx,
            cancel,
            join: Some(join),
        }
    }

    /// Ask the worker to stop at the next file boundary.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    pub fn is_running(&self) -> bool {
        self.join.as_ref().is_some_and(|j| !j.is_finished())
    }

    /// Cancel and wait up to `timeout` for the worker to exit. Returns whether
    /// it stopped in time; a worker that did not is left to finish on its own.
    pub fn cancel_and_wait(mut self, timeout: Duration) -> bool {
        self.cancel();
        let deadline = Instant::now() + timeout;
        while self.is_running() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }
        if self.is_running() {
            return false;
        }
        if let Some(j) = self.join.take() {
            let _ = j.join();
        }
        true
    }

    /// Non-blocking: next pending event, if any. `None` also once the worker
    /// has exited and every event was drained.
    pub fn try_next(&self) -> Option<ScanEvent> {
        match self.rx.try_recv() {
            Ok(ev) => Some(ev),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Block until the next event arrives or the worker is gone.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<ScanEvent> {
        self.rx.recv_timeout(timeout).ok()
    }
}

fn run_worker(
    roots: Vec<PathBuf>,
    options: ScanOptions,
    cancel: Arc<AtomicBool>,
    tx: Sender<ScanEvent>,
) {
    info!("scan started over {} root(s)", roots.len());
    scan_roots(&roots, &options, &cancel, |ev| {
        // The owner may have dropped the handle after abandoning this scan.
        let _ = tx.send(ev);
    });
}
