//! Encrypted keystore file, the primary secret store
//!
//! Entries are sealed with AES-256-GCM under a random device key kept in a
//! separate file next to the keystore. On Unix the key file is created with
//! mode `0600`.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::crypto::{decrypt, encrypt, EncryptedData, SecretKey};
use crate::storage::{read_json, write_json_private};

use super::secret_store::{scoped_key, SecretStore, SecretStoreError};

#[derive(Debug, Default, Serialize, Deserialize)]
struct KeystoreData {
    #[serde(default)]
    entries: BTreeMap<String, EncryptedData>,
}

/// Secret store backed by an encrypted JSON file
pub struct KeystoreFile {
    service: String,
    path: PathBuf,
    key_path: PathBuf,
}

impl KeystoreFile {
    pub fn new(service: impl Into<String>, path: PathBuf, key_path: PathBuf) -> Self {
        Self {
            service: service.into(),
            path,
            key_path,
        }
    }

    fn load(&self) -> Result<KeystoreData, SecretStoreError> {
        read_json(&self.path).map_err(|e| SecretStoreError::Io(e.to_string()))
    }

    fn store(&self, data: &KeystoreData) -> Result<(), SecretStoreError> {
        write_json_private(&self.path, data).map_err(|e| SecretStoreError::Io(e.to_string()))
    }

    /// Read the device key, creating it on first use
    fn device_key(&self, create: bool) -> Result<Option<SecretKey>, SecretStoreError> {
        if self.key_path.exists() {
            let encoded = fs::read_to_string(&self.key_path)
                .map_err(|e| SecretStoreError::Io(e.to_string()))?;
            return SecretKey::from_base64(&encoded)
                .map(Some)
                .map_err(|_| SecretStoreError::AuthFailed);
        }

        if !create {
            return Ok(None);
        }

        let key = SecretKey::generate();
        write_key_file(&self.key_path, &key.to_base64())
            .map_err(|e| SecretStoreError::Io(e.to_string()))?;
        tracing::debug!(path = %self.key_path.display(), "created keystore device key");
        Ok(Some(key))
    }
}

#[cfg(unix)]
fn write_key_file(path: &Path, encoded: &str) -> std::io::Result<()> {
    use std::os::unix::fs::OpenOptionsExt;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(0o600)
        .open(path)?;
    file.write_all(encoded.as_bytes())?;
    file.sync_all()
}

#[cfg(not(unix))]
fn write_key_file(path: &Path, encoded: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)?;
    file.write_all(encoded.as_bytes())?;
    file.sync_all()
}

impl SecretStore for KeystoreFile {
    fn name(&self) -> &'static str {
        "keystore"
    }

    fn put(&self, account: &str, secret: &[u8]) -> Result<(), SecretStoreError> {
        let mut data = self.load()?;
        let key = scoped_key(&self.service, account);
        if data.entries.contains_key(&key) {
            return Err(SecretStoreError::Duplicate);
        }

        let device_key = self
            .device_key(true)?
            .ok_or(SecretStoreError::MissingEntitlement)?;
        let sealed = encrypt(secret, &device_key).map_err(|e| SecretStoreError::Io(e.to_string()))?;

        data.entries.insert(key, sealed);
        self.store(&data)
    }

    fn get(&self, account: &str) -> Result<Option<Vec<u8>>, SecretStoreError> {
        let data = self.load()?;
        let sealed = match data.entries.get(&scoped_key(&self.service, account)) {
            Some(sealed) => sealed,
            None => return Ok(None),
        };

        let device_key = self.device_key(false)?.ok_or(SecretStoreError::AuthFailed)?;
        decrypt(sealed, &device_key)
            .map(Some)
            .map_err(|_| SecretStoreError::AuthFailed)
    }

    fn delete(&self, account: &str) -> Result<(), SecretStoreError> {
        let mut data = self.load()?;
        if data
            .entries
            .remove(&scoped_key(&self.service, account))
            .is_none()
        {
            return Err(SecretStoreError::NotFound);
        }
        self.store(&data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_keystore(dir: &TempDir, service: &str) -> KeystoreFile {
        KeystoreFile::new(
            service,
            dir.path().join("keystore.json"),
            dir.path().join("keystore.key"),
        )
    }

    #[test]
    fn test_put_and_get() {
        let dir = TempDir::new().unwrap();
        let store = create_keystore(&dir, "test");

        store.put("password", b"$argon2id$...").unwrap();
        assert_eq!(store.get("password").unwrap(), Some(b"$argon2id$...".to_vec()));
        assert_eq!(store.get("missing").unwrap(), None);
    }

    #[test]
    fn test_secret_not_stored_in_clear() {
        let dir = TempDir::new().unwrap();
        let store = create_keystore(&dir, "test");
        store.put("password", b"plain-marker").unwrap();

        let raw = fs::read_to_string(dir.path().join("keystore.json")).unwrap();
        assert!(!raw.contains("plain-marker"));
    }

    #[test]
    fn test_duplicate_and_delete() {
        let dir = TempDir::new().unwrap();
        let store = create_keystore(&dir, "test");
        store.put("answer", b"a").unwrap();

        assert_eq!(store.put("answer", b"b"), Err(SecretStoreError::Duplicate));
        store.delete("answer").unwrap();
        assert_eq!(store.delete("answer"), Err(SecretStoreError::NotFound));
    }

    #[test]
    fn test_services_are_isolated() {
        let dir = TempDir::new().unwrap();
        create_keystore(&dir, "one").put("password", b"1").unwrap();

        assert_eq!(create_keystore(&dir, "two").get("password").unwrap(), None);
    }

    #[test]
    fn test_lost_device_key_fails_auth() {
        let dir = TempDir::new().unwrap();
        let store = create_keystore(&dir, "test");
        store.put("password", b"hash").unwrap();

        fs::remove_file(dir.path().join("keystore.key")).unwrap();
        assert_eq!(store.get("password"), Err(SecretStoreError::AuthFailed));
    }

    #[cfg(unix)]
    #[test]
    fn test_key_file_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        create_keystore(&dir, "test").put("password", b"hash").unwrap();

        let mode = fs::metadata(dir.path().join("keystore.key"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
