//! Encoded fallback secret store
//!
//! Used when the keystore refuses a write. Secrets are base64-encoded into
//! the plain preferences file. This is obfuscation only: anyone who can read
//! the file can recover the stored hash. Every write is logged as a warning.

use std::path::PathBuf;

use base64::{engine::general_purpose::STANDARD, Engine};
use serde_json::{Map, Value};

use crate::storage::{read_json, write_json_private};

use super::secret_store::{scoped_key, SecretStore, SecretStoreError};

pub struct EncodedFallbackStore {
    service: String,
    path: PathBuf,
}

impl EncodedFallbackStore {
    pub fn new(service: impl Into<String>, path: PathBuf) -> Self {
        Self {
            service: service.into(),
            path,
        }
    }

    fn load(&self) -> Result<Map<String, Value>, SecretStoreError> {
        read_json(&self.path).map_err(|e| SecretStoreError::Io(e.to_string()))
    }

    fn store(&self, prefs: &Map<String, Value>) -> Result<(), SecretStoreError> {
        write_json_private(&self.path, prefs).map_err(|e| SecretStoreError::Io(e.to_string()))
    }
}

impl SecretStore for EncodedFallbackStore {
    fn name(&self) -> &'static str {
        "preferences"
    }

    fn put(&self, account: &str, secret: &[u8]) -> Result<(), SecretStoreError> {
        let mut prefs = self.load()?;
        let key = scoped_key(&self.service, account);
        if prefs.contains_key(&key) {
            return Err(SecretStoreError::Duplicate);
        }

        tracing::warn!(
            account,
            path = %self.path.display(),
            "storing secret in the encoded preferences file; it is not encrypted"
        );
        prefs.insert(key, Value::String(STANDARD.encode(secret)));
        self.store(&prefs)
    }

    fn get(&self, account: &str) -> Result<Option<Vec<u8>>, SecretStoreError> {
        let prefs = self.load()?;
        match prefs.get(&scoped_key(&self.service, account)) {
            Some(Value::String(encoded)) => STANDARD
                .decode(encoded)
                .map(Some)
                .map_err(|e| SecretStoreError::Io(format!("corrupt fallback entry: {}", e))),
            Some(_) => Err(SecretStoreError::Io("corrupt fallback entry".to_string())),
            None => Ok(None),
        }
    }

    fn delete(&self, account: &str) -> Result<(), SecretStoreError> {
        let mut prefs = self.load()?;
        if prefs.remove(&scoped_key(&self.service, account)).is_none() {
            return Err(SecretStoreError::NotFound);
        }
        self.store(&prefs)
    }
}
