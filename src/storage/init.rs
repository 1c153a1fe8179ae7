//! First-run setup
//!
//! Creates the directory layout, the settings file and an empty file for
//! every collection so the data directory is complete from the start.

use crate::config::paths::MaterielPaths;
use crate::config::settings::Settings;
use crate::error::MaterielError;

use super::Storage;

/// Initialize storage for a fresh installation
///
/// Existing settings and data are left untouched. Returns `true` when the
/// installation was created by this call.
pub fn initialize_storage(paths: &MaterielPaths) -> Result<bool, MaterielError> {
    paths.ensure_directories()?;

    if paths.is_initialized() {
        return Ok(false);
    }

    let storage = Storage::new(paths.clone())?;
    storage.load_all()?;
    storage.save_all()?;

    Settings::default().save(paths)?;
    tracing::info!(base_dir = %paths.base_dir().display(), "initialized data directory");

    Ok(true)
}
