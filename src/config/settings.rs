//! User settings for Materiel
//!
//! Manages user preferences such as the currency symbol, the default VAT
//! rate for new articles and the password hashing cost.

use serde::{Deserialize, Serialize};

use super::paths::MaterielPaths;
use crate::crypto::HashParams;
use crate::error::MaterielError;
use crate::models::VatRate;

/// Vault-related settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultSettings {
    /// Argon2id cost used when hashing the password and recovery answer
    #[serde(default)]
    pub hash_params: HashParams,

    /// Offer biometric unlock when the platform supports it
    #[serde(default = "default_true")]
    pub biometrics_enabled: bool,
}

impl Default for VaultSettings {
    fn default() -> Self {
        Self {
            hash_params: HashParams::default(),
            biometrics_enabled: true,
        }
    }
}

/// CSV export options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsvSettings {
    #[serde(default = "default_delimiter")]
    pub delimiter: char,

    /// Start files with a UTF-8 byte order mark so spreadsheets detect the
    /// encoding
    #[serde(default = "default_true")]
    pub bom: bool,
}

impl Default for CsvSettings {
    fn default() -> Self {
        Self {
            delimiter: default_delimiter(),
            bom: true,
        }
    }
}

/// User settings for Materiel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Currency symbol shown after amounts
    #[serde(default = "default_currency")]
    pub currency_symbol: String,

    /// VAT rate proposed for new articles
    #[serde(default)]
    pub default_vat_rate: VatRate,

    /// Date format preference (strftime format)
    #[serde(default = "default_date_format")]
    pub date_format: String,

    /// Default loan length in days when no return date is given
    #[serde(default = "default_loan_days")]
    pub default_loan_days: u32,

    #[serde(default)]
    pub vault: VaultSettings,

    #[serde(default)]
    pub csv: CsvSettings,
}

fn default_schema_version() -> u32 {
    1
}

fn default_currency() -> String {
    "€".to_string()
}

fn default_date_format() -> String {
    "%d/%m/%Y".to_string()
}

fn default_loan_days() -> u32 {
    14
}

fn default_delimiter() -> char {
    ';'
}

fn default_true() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            currency_symbol: default_currency(),
            default_vat_rate: VatRate::default(),
            date_format: default_date_format(),
            default_loan_days: default_loan_days(),
            vault: VaultSettings::default(),
            csv: CsvSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from disk, or create default settings if file doesn't exist
    pub fn load_or_create(paths: &MaterielPaths) -> Result<Self, MaterielError> {
        let settings_path = paths.settings_file();

        if settings_path.exists() {
            let contents = std::fs::read_to_string(&settings_path).map_err(|e| {
                MaterielError::Io(format!("Failed to read settings file: {}", e))
            })?;

            let settings: Settings = serde_json::from_str(&contents).map_err(|e| {
                MaterielError::Config(format!("Failed to parse settings file: {}", e))
            })?;

            Ok(settings)
        } else {
            // Don't save yet - let caller decide when to persist
            Ok(Settings::default())
        }
    }

    /// Save settings to disk
    pub fn save(&self, paths: &MaterielPaths) -> Result<(), MaterielError> {
        paths.ensure_directories()?;

        let contents = serde_json::to_string_pretty(self).map_err(|e| {
            MaterielError::Config(format!("Failed to serialize settings: {}", e))
        })?;

        std::fs::write(paths.settings_file(), contents)
            .map_err(|e| MaterielError::Io(format!("Failed to write settings file: {}", e)))?;

        Ok(())
    }
}
