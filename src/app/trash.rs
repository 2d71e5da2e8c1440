use std::path::Path;

use crate::error::TrashError;

/// Moves files to the platform's trash / recycle bin.
pub trait TrashBin {
    fn trash(&self, path: &Path) -> Result<(), TrashError>;
}

/// [`TrashBin`] backed by the `trash` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemTrash;

impl TrashBin for SystemTrash {
    fn trash(&self, path: &Path) -> Result<(), TrashError> {
        trash::delete(path).map_err(|e| TrashError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}
