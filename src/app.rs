//! Application module: the explicitly owned session object.
//!
//! `App` lives in `app::model` and owns the library index, the playback
//! session, the persistence store and any running scan. Front ends drive it
//! through its command methods.

mod model;
mod trash;

pub use model::*;
pub use trash::{SystemTrash, TrashBin};

#[cfg(test)]
mod tests;
