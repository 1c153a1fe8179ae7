//! Secret storage capability
//!
//! The vault keeps its secrets (password hash, recovery answer hash and the
//! document content key) in a [`SecretStore`]. Stores are scoped by a
//! service name and addressed by account.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use thiserror::Error;

/// Service name under which the vault stores its secrets
pub const VAULT_SERVICE: &str = "materiel.vault";

/// Status returned by a failing secret store operation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SecretStoreError {
    #[error("no secret stored for this account")]
    NotFound,

    #[error("a secret already exists for this account")]
    Duplicate,

    #[error("the store refused access to the secret")]
    AuthFailed,

    #[error("the store is not available to this application")]
    MissingEntitlement,

    #[error("secret store I/O failure: {0}")]
    Io(String),
}

/// A place where the vault can keep small secrets
pub trait SecretStore {
    /// Short name used in log messages
    fn name(&self) -> &'static str;

    /// Store a secret; fails with `Duplicate` if the account already has one
    fn put(&self, account: &str, secret: &[u8]) -> Result<(), SecretStoreError>;

    /// Read a secret, `Ok(None)` when the account has none
    fn get(&self, account: &str) -> Result<Option<Vec<u8>>, SecretStoreError>;

    /// Remove a secret; fails with `NotFound` if the account has none
    fn delete(&self, account: &str) -> Result<(), SecretStoreError>;
}

impl<S: SecretStore + ?Sized> SecretStore for Arc<S> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn put(&self, account: &str, secret: &[u8]) -> Result<(), SecretStoreError> {
        (**self).put(account, secret)
    }

    fn get(&self, account: &str) -> Result<Option<Vec<u8>>, SecretStoreError> {
        (**self).get(account)
    }

    fn delete(&self, account: &str) -> Result<(), SecretStoreError> {
        (**self).delete(account)
    }
}

/// Key under which a store files an account's secret
pub(crate) fn scoped_key(service: &str, account: &str) -> String {
    format!("{}.{}", service, account)
}

/// In-memory secret store
///
/// Used by tests and by callers that inject their own storage. Reads and
/// writes can be made to fail to exercise the fallback path.
#[derive(Default)]
pub struct MemorySecretStore {
    entries: RwLock<HashMap<String, Vec<u8>>>,
    fail_writes: AtomicBool,
    fail_reads: AtomicBool,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose writes always fail with `MissingEntitlement`
    pub fn failing() -> Self {
        let store = Self::default();
        store.set_fail_writes(true);
        store
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn contains(&self, account: &str) -> bool {
        self.entries
            .read()
            .map(|entries| entries.contains_key(account))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<T>(_: T) -> SecretStoreError {
    SecretStoreError::Io("secret store lock poisoned".to_string())
}

impl SecretStore for MemorySecretStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn put(&self, account: &str, secret: &[u8]) -> Result<(), SecretStoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(SecretStoreError::MissingEntitlement);
        }
        let mut entries = self.entries.write().map_err(poisoned)?;
        if entries.contains_key(account) {
            return Err(SecretStoreError::Duplicate);
        }
        entries.insert(account.to_string(), secret.to_vec());
        Ok(())
    }

    fn get(&self, account: &str) -> Result<Option<Vec<u8>>, SecretStoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(SecretStoreError::AuthFailed);
        }
        Ok(self.entries.read().map_err(poisoned)?.get(account).cloned())
    }

    fn delete(&self, account: &str) -> Result<(), SecretStoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(SecretStoreError::MissingEntitlement);
        }
        match self.entries.write().map_err(poisoned)?.remove(account) {
            Some(_) => Ok(()),
            None => Err(SecretStoreError::NotFound),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_get_delete() {
        let store = MemorySecretStore::new();
        store.put("password", b"hash").unwrap();

        assert_eq!(store.get("password").unwrap(), Some(b"hash".to_vec()));
        assert_eq!(store.put("password", b"other"), Err(SecretStoreError::Duplicate));

        store.delete("password").unwrap();
        assert_eq!(store.get("password").unwrap(), None);
        assert_eq!(store.delete("password"), Err(SecretStoreError::NotFound));
    }

    #[test]
    fn test_failing_store() {
        let store = MemorySecretStore::failing();
        assert_eq!(
            store.put("password", b"hash"),
            Err(SecretStoreError::MissingEntitlement)
        );
        assert!(store.is_empty());

        store.set_fail_writes(false);
        store.put("password", b"hash").unwrap();
        store.set_fail_reads(true);
        assert_eq!(store.get("password"), Err(SecretStoreError::AuthFailed));
    }

    #[test]
    fn test_shared_through_arc() {
        let store = Arc::new(MemorySecretStore::new());
        let boxed: Box<dyn SecretStore> = Box::new(store.clone());

        boxed.put("answer", b"x").unwrap();
        assert!(store.contains("answer"));
    }

    #[test]
    fn test_scoped_key() {
        assert_eq!(scoped_key(VAULT_SERVICE, "password"), "materiel.vault.password");
    }
}
