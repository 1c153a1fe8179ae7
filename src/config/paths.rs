//! Path management for Materiel
//!
//! ## Path Resolution Order
//!
//! 1. `MATERIEL_DATA_DIR` environment variable (if set)
//! 2. The platform configuration directory reported by `directories`
//!    (`~/.config/materiel` on Linux, `~/Library/Application Support/...` on
//!    macOS, `%APPDATA%\...` on Windows)

use std::path::PathBuf;

use directories::ProjectDirs;

use crate::error::MaterielError;

/// Manages all paths used by Materiel
#[derive(Debug, Clone)]
pub struct MaterielPaths {
    base_dir: PathBuf,
}

impl MaterielPaths {
    /// Resolve the base directory from the environment or the platform default
    ///
    /// # Errors
    ///
    /// Returns an error if no home directory can be determined.
    pub fn new() -> Result<Self, MaterielError> {
        let base_dir = if let Ok(custom) = std::env::var("MATERIEL_DATA_DIR") {
            PathBuf::from(custom)
        } else {
            ProjectDirs::from("", "", "materiel")
                .map(|dirs| dirs.config_dir().to_path_buf())
                .ok_or_else(|| {
                    MaterielError::Config("Could not determine a home directory".into())
                })?
        };

        Ok(Self { base_dir })
    }

    /// Create MaterielPaths with a custom base directory (useful for testing)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Entity collections live here
    pub fn data_dir(&self) -> PathBuf {
        self.base_dir.join("data")
    }

    /// Encrypted document blobs and the vault keystore live here
    pub fn vault_dir(&self) -> PathBuf {
        self.base_dir.join("vault")
    }

    pub fn exports_dir(&self) -> PathBuf {
        self.base_dir.join("exports")
    }

    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    pub fn audit_log(&self) -> PathBuf {
        self.base_dir.join("audit.log")
    }

    pub fn articles_file(&self) -> PathBuf {
        self.data_dir().join("articles.json")
    }

    pub fn transactions_file(&self) -> PathBuf {
        self.data_dir().join("transactions.json")
    }

    pub fn materials_file(&self) -> PathBuf {
        self.data_dir().join("materials.json")
    }

    pub fn persons_file(&self) -> PathBuf {
        self.data_dir().join("persons.json")
    }

    pub fn loans_file(&self) -> PathBuf {
        self.data_dir().join("loans.json")
    }

    pub fn rentals_file(&self) -> PathBuf {
        self.data_dir().join("rentals.json")
    }

    pub fn repairs_file(&self) -> PathBuf {
        self.data_dir().join("repairs.json")
    }

    pub fn vault_items_file(&self) -> PathBuf {
        self.vault_dir().join("items.json")
    }

    /// Non-secret vault state (has-password flag, recovery question)
    pub fn vault_state_file(&self) -> PathBuf {
        self.vault_dir().join("state.json")
    }

    /// Primary encrypted keystore
    pub fn keystore_file(&self) -> PathBuf {
        self.vault_dir().join("keystore.json")
    }

    /// Device key protecting the keystore
    pub fn keystore_key_file(&self) -> PathBuf {
        self.vault_dir().join("keystore.key")
    }

    /// Plain preferences file used as the encoded fallback secret store
    pub fn preferences_file(&self) -> PathBuf {
        self.base_dir.join("preferences.json")
    }

    pub fn documents_dir(&self) -> PathBuf {
        self.vault_dir().join("documents")
    }

    /// Ensure all required directories exist
    pub fn ensure_directories(&self) -> Result<(), MaterielError> {
        std::fs::create_dir_all(&self.base_dir)
            .map_err(|e| MaterielError::Io(format!("Failed to create base directory: {}", e)))?;

        std::fs::create_dir_all(self.data_dir())
            .map_err(|e| MaterielError::Io(format!("Failed to create data directory: {}", e)))?;

        std::fs::create_dir_all(self.documents_dir()).map_err(|e| {
            MaterielError::Io(format!("Failed to create vault directory: {}", e))
        })?;

        Ok(())
    }

    /// Check if Materiel has been initialized (config file exists)
    pub fn is_initialized(&self) -> bool {
        self.settings_file().exists()
    }
}
