//! JSON files on disk
//!
//! Every write goes to a temporary sibling first and is renamed over the
//! target once synced, so a crash leaves either the old or the new file.
//! Vault files are written readable by the owner only.

use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{de::DeserializeOwned, Serialize};

use crate::error::MaterielError;

fn storage_err(action: &str, path: &Path, e: impl std::fmt::Display) -> MaterielError {
    MaterielError::Storage(format!("Failed to {} {}: {}", action, path.display(), e))
}

fn parse_file<T: DeserializeOwned>(path: &Path) -> Result<T, MaterielError> {
    let file = File::open(path).map_err(|e| storage_err("open", path, e))?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| storage_err("parse", path, e))
}

/// Read JSON from a file, returning a default value if the file doesn't exist
pub fn read_json<T, P>(path: P) -> Result<T, MaterielError>
where
    T: DeserializeOwned + Default,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    if !path.exists() {
        return Ok(T::default());
    }
    parse_file(path)
}

/// Read JSON from a file that must exist
pub fn read_json_required<T, P>(path: P) -> Result<T, MaterielError>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    if !path.exists() {
        return Err(MaterielError::Storage(format!(
            "File not found: {}",
            path.display()
        )));
    }
    parse_file(path)
}

/// Write pretty-printed JSON atomically
pub fn write_json_atomic<T, P>(path: P, data: &T) -> Result<(), MaterielError>
where
    T: Serialize,
    P: AsRef<Path>,
{
    write_atomic(path.as_ref(), data, false)
}

/// Write JSON atomically with owner-only permissions (0600 on Unix)
///
/// Used for the vault state, the keystore, the fallback store and sealed
/// documents.
pub fn write_json_private<T, P>(path: P, data: &T) -> Result<(), MaterielError>
where
    T: Serialize,
    P: AsRef<Path>,
{
    write_atomic(path.as_ref(), data, true)
}

fn write_atomic<T: Serialize>(path: &Path, data: &T, private: bool) -> Result<(), MaterielError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| storage_err("create directory", parent, e))?;
    }

    // Same directory as the target so the rename stays on one filesystem
    let temp_path = path.with_extension("json.tmp");

    let file = open_for_write(&temp_path, private)
        .map_err(|e| storage_err("create", &temp_path, e))?;
    let mut writer = BufWriter::new(file);

    let written = serde_json::to_writer_pretty(&mut writer, data)
        .map_err(|e| MaterielError::Storage(format!("Failed to serialize data: {}", e)))
        .and_then(|_| writer.flush().map_err(|e| storage_err("flush", &temp_path, e)))
        .and_then(|_| {
            writer
                .get_ref()
                .sync_all()
                .map_err(|e| storage_err("sync", &temp_path, e))
        });

    if let Err(e) = written.and_then(|_| {
        fs::rename(&temp_path, path).map_err(|e| storage_err("replace", path, e))
    }) {
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }

    Ok(())
}

#[cfg(unix)]
fn open_for_write(path: &Path, private: bool) -> std::io::Result<File> {
    use std::os::unix::fs::OpenOptionsExt;

    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    if private {
        options.mode(0o600);
    }
    options.open(path)
}

#[cfg(not(unix))]
fn open_for_write(path: &Path, _private: bool) -> std::io::Result<File> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
    struct Shelf {
        label: String,
        slots: u32,
    }

    fn shelf() -> Shelf {
        Shelf {
            label: "Atelier".to_string(),
            slots: 12,
        }
    }

    #[test]
    fn test_missing_file_reads_as_default() {
        let temp_dir = TempDir::new().unwrap();
        let data: Shelf = read_json(temp_dir.path().join("absent.json")).unwrap();
        assert_eq!(data, Shelf::default());
    }

    #[test]
    fn test_write_then_read_in_nested_directory() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("data").join("shelf.json");

        write_json_atomic(&path, &shelf()).unwrap();

        let loaded: Shelf = read_json(&path).unwrap();
        assert_eq!(loaded, shelf());
        assert!(!temp_dir.path().join("data").join("shelf.json.tmp").exists());
    }

    #[test]
    fn test_corrupt_file_names_the_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("articles.json");
        fs::write(&path, "{ not json").unwrap();

        let err = read_json::<Shelf, _>(&path).unwrap_err();
        assert!(err.to_string().contains("articles.json"));
    }

    #[test]
    fn test_read_required_fails_when_missing() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("doc.enc");

        assert!(read_json_required::<Shelf, _>(&path).is_err());
        write_json_private(&path, &shelf()).unwrap();
        assert_eq!(read_json_required::<Shelf, _>(&path).unwrap(), shelf());
    }

    #[cfg(unix)]
    #[test]
    fn test_private_files_are_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("vault.json");
        write_json_private(&path, &shelf()).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
