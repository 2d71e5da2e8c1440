//! Persistence of library and session state across restarts.
//!
//! The snapshot is a single JSON document written with write-then-rename.
//! Saves requested while the library or session change are debounced by
//! [`SaveScheduler`]; shutdown flushes unconditionally.

mod debounce;
mod snapshot;
mod store;

pub use debounce::SaveScheduler;
pub use snapshot::{PersistedSnapshot, PersistedState, now_epoch_secs};
pub use store::PersistenceStore;
