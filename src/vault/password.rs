//! Password and recovery management
//!
//! Secrets are Argon2id PHC strings written primary-first, fallback-second.
//! The non-secret part of the vault (whether a password exists and the
//! recovery question) lives in `vault/state.json`.

use std::collections::BTreeSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::paths::MaterielPaths;
use crate::crypto::{hash_secret, verify_secret, HashParams, SecretKey};
use crate::error::{MaterielError, MaterielResult};
use crate::storage::{read_json, write_json_private};

use super::fallback::EncodedFallbackStore;
use super::keystore::KeystoreFile;
use super::secret_store::{SecretStore, SecretStoreError, VAULT_SERVICE};

/// Minimum password length, in characters
pub const MIN_PASSWORD_LENGTH: usize = 4;

/// Minimum recovery answer length after trimming, in characters
pub const MIN_ANSWER_LENGTH: usize = 2;

const PASSWORD_ACCOUNT: &str = "password";
const RECOVERY_ACCOUNT: &str = "recovery_answer";
const CONTENT_KEY_ACCOUNT: &str = "content_key";

/// Where a secret ended up after a write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretLocation {
    Primary,
    Fallback,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct VaultState {
    #[serde(default)]
    has_password: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    recovery_question: Option<String>,

    /// Accounts whose current secret was written to the fallback store.
    /// The primary may still hold an older value for them.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    in_fallback: BTreeSet<String>,
}

/// Owns the vault password, the recovery question and answer, and the key
/// used to seal vault documents
pub struct PasswordManager {
    primary: Box<dyn SecretStore>,
    fallback: Box<dyn SecretStore>,
    state_path: PathBuf,
    state: VaultState,
    params: HashParams,
}

/// Lowercase and trim a recovery answer before hashing or comparing it
fn normalize_answer(answer: &str) -> String {
    answer.trim().to_lowercase()
}

/// Check recovery input without touching any store
pub fn validate_recovery(question: &str, answer: &str) -> MaterielResult<()> {
    if question.trim().is_empty() {
        return Err(MaterielError::Validation(
            "Recovery question cannot be empty".into(),
        ));
    }
    if normalize_answer(answer).chars().count() < MIN_ANSWER_LENGTH {
        return Err(MaterielError::Validation(format!(
            "Recovery answer must be at least {} characters",
            MIN_ANSWER_LENGTH
        )));
    }
    Ok(())
}

fn validate_password(password: &str) -> MaterielResult<()> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(MaterielError::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

impl PasswordManager {
    pub fn new(
        primary: Box<dyn SecretStore>,
        fallback: Box<dyn SecretStore>,
        state_path: PathBuf,
        params: HashParams,
    ) -> MaterielResult<Self> {
        let state: VaultState = read_json(&state_path)?;
        Ok(Self {
            primary,
            fallback,
            state_path,
            state,
            params,
        })
    }

    /// Open the vault with the keystore file and the preferences fallback
    pub fn open(paths: &MaterielPaths, params: HashParams) -> MaterielResult<Self> {
        let primary = KeystoreFile::new(
            VAULT_SERVICE,
            paths.keystore_file(),
            paths.keystore_key_file(),
        );
        let fallback = EncodedFallbackStore::new(VAULT_SERVICE, paths.preferences_file());
        Self::new(
            Box::new(primary),
            Box::new(fallback),
            paths.vault_state_file(),
            params,
        )
    }

    pub fn has_password(&self) -> bool {
        self.state.has_password
    }

    pub fn recovery_question(&self) -> Option<&str> {
        self.state.recovery_question.as_deref()
    }

    fn save_state(&self) -> MaterielResult<()> {
        write_json_private(&self.state_path, &self.state)
    }

    /// Record which store holds the current value of `account`
    fn set_location(&mut self, account: &str, location: SecretLocation) -> MaterielResult<()> {
        let changed = match location {
            SecretLocation::Primary => self.state.in_fallback.remove(account),
            SecretLocation::Fallback => self.state.in_fallback.insert(account.to_string()),
        };
        if changed {
            self.save_state()?;
        }
        Ok(())
    }

    /// Write a secret to the primary store, or to the fallback if it refuses
    fn write_secret(&mut self, account: &str, secret: &[u8]) -> MaterielResult<SecretLocation> {
        let location = self.put_secret(account, secret)?;
        self.set_location(account, location)?;
        Ok(location)
    }

    fn put_secret(&self, account: &str, secret: &[u8]) -> MaterielResult<SecretLocation> {
        match self.primary.delete(account) {
            Ok(()) | Err(SecretStoreError::NotFound) => {}
            Err(e) => {
                tracing::warn!(account, store = self.primary.name(), error = %e, "stale secret not removed")
            }
        }

        let primary_error = match self.primary.put(account, secret) {
            Ok(()) => {
                let _ = self.fallback.delete(account);
                return Ok(SecretLocation::Primary);
            }
            Err(e) => e,
        };

        tracing::warn!(
            account,
            store = self.primary.name(),
            error = %primary_error,
            "primary secret store refused the write, using fallback"
        );

        let _ = self.fallback.delete(account);
        match self.fallback.put(account, secret) {
            Ok(()) => Ok(SecretLocation::Fallback),
            Err(fallback_error) => {
                tracing::error!(account, error = %fallback_error, "fallback secret store refused the write");
                Err(MaterielError::SecretStorage(format!(
                    "{}: {}; {}: {}",
                    self.primary.name(),
                    primary_error,
                    self.fallback.name(),
                    fallback_error
                )))
            }
        }
    }

    /// Read a secret from the primary store, then from the fallback
    ///
    /// An account last written to the fallback is read from there only.
    fn read_secret(&self, account: &str) -> Option<Vec<u8>> {
        if self.state.in_fallback.contains(account) {
            return self.read_fallback(account);
        }

        match self.primary.get(account) {
            Ok(Some(secret)) => return Some(secret),
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(account, store = self.primary.name(), error = %e, "secret read failed")
            }
        }

        self.read_fallback(account)
    }

    fn read_fallback(&self, account: &str) -> Option<Vec<u8>> {
        match self.fallback.get(account) {
            Ok(secret) => secret,
            Err(e) => {
                tracing::warn!(account, store = self.fallback.name(), error = %e, "secret read failed");
                None
            }
        }
    }

    fn delete_secret(&self, account: &str) {
        for store in [&self.primary, &self.fallback] {
            match store.delete(account) {
                Ok(()) | Err(SecretStoreError::NotFound) => {}
                Err(e) => {
                    tracing::warn!(account, store = store.name(), error = %e, "secret delete failed")
                }
            }
        }
    }

    fn matches(&self, account: &str, candidate: &str) -> bool {
        self.read_secret(account)
            .and_then(|bytes| String::from_utf8(bytes).ok())
            .map(|phc| verify_secret(candidate, &phc))
            .unwrap_or(false)
    }

    /// Set the vault password
    ///
    /// Fails with `SecretStorage` if neither store accepts it, in which case
    /// `has_password` is unchanged.
    pub fn set_password(&mut self, new_password: &str) -> MaterielResult<SecretLocation> {
        validate_password(new_password)?;

        let phc = hash_secret(new_password, &self.params)?;
        let location = self.write_secret(PASSWORD_ACCOUNT, phc.as_bytes())?;

        self.state.has_password = true;
        self.save_state()?;
        tracing::debug!(?location, "vault password set");
        Ok(location)
    }

    /// Exact comparison: case-sensitive, no trimming
    pub fn verify_password(&self, candidate: &str) -> bool {
        self.matches(PASSWORD_ACCOUNT, candidate)
    }

    pub fn set_recovery_question(
        &mut self,
        question: &str,
        answer: &str,
    ) -> MaterielResult<SecretLocation> {
        validate_recovery(question, answer)?;

        let phc = hash_secret(&normalize_answer(answer), &self.params)?;
        let location = self.write_secret(RECOVERY_ACCOUNT, phc.as_bytes())?;

        self.state.recovery_question = Some(question.trim().to_string());
        self.save_state()?;
        Ok(location)
    }

    /// Case-insensitive comparison, surrounding whitespace ignored
    pub fn verify_recovery_answer(&self, candidate: &str) -> bool {
        self.state.recovery_question.is_some()
            && self.matches(RECOVERY_ACCOUNT, &normalize_answer(candidate))
    }

    pub fn change_password(
        &mut self,
        old_password: &str,
        new_password: &str,
    ) -> MaterielResult<SecretLocation> {
        if !self.verify_password(old_password) {
            tracing::info!("password change rejected: wrong current password");
            return Err(MaterielError::InvalidCredentials);
        }
        self.set_password(new_password)
    }

    pub fn reset_password_with_recovery(
        &mut self,
        answer: &str,
        new_password: &str,
    ) -> MaterielResult<SecretLocation> {
        if !self.verify_recovery_answer(answer) {
            tracing::info!("password reset rejected: wrong recovery answer");
            return Err(MaterielError::InvalidCredentials);
        }
        self.set_password(new_password)
    }

    /// Forget the password and the recovery question and answer
    pub fn remove_password(&mut self) -> MaterielResult<()> {
        self.delete_secret(PASSWORD_ACCOUNT);
        self.delete_secret(RECOVERY_ACCOUNT);

        self.state = VaultState::default();
        self.save_state()
    }

    /// Key sealing vault documents, created on first use
    ///
    /// The key is random and kept in the secret stores next to the password
    /// hash. It does not depend on the password, so changing or resetting
    /// the password leaves existing documents readable.
    pub fn content_key(&mut self) -> MaterielResult<SecretKey> {
        if let Some(encoded) = self.read_secret(CONTENT_KEY_ACCOUNT) {
            let encoded = String::from_utf8(encoded)
                .map_err(|_| MaterielError::Encryption("Corrupt content key".into()))?;
            return SecretKey::from_base64(&encoded);
        }

        let key = SecretKey::generate();
        self.write_secret(CONTENT_KEY_ACCOUNT, key.to_base64().as_bytes())?;
        Ok(key)
    }

    pub fn remove_content_key(&mut self) -> MaterielResult<()> {
        self.delete_secret(CONTENT_KEY_ACCOUNT);
        self.set_location(CONTENT_KEY_ACCOUNT, SecretLocation::Primary)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::vault::secret_store::MemorySecretStore;
    use std::sync::Arc;
    use tempfile::TempDir;

    pub(crate) struct Fixture {
        pub dir: TempDir,
        pub primary: Arc<MemorySecretStore>,
        pub fallback: Arc<MemorySecretStore>,
    }

    impl Fixture {
        pub fn new() -> Self {
            Self {
                dir: TempDir::new().unwrap(),
                primary: Arc::new(MemorySecretStore::new()),
                fallback: Arc::new(MemorySecretStore::new()),
            }
        }

        pub fn manager(&self) -> PasswordManager {
            PasswordManager::new(
                Box::new(self.primary.clone()),
                Box::new(self.fallback.clone()),
                self.dir.path().join("state.json"),
                HashParams::with_values(1024, 1, 1),
            )
            .unwrap()
        }
    }

    #[test]
    fn test_verify_after_set() {
        let fx = Fixture::new();
        let mut manager = fx.manager();
        assert!(!manager.has_password());

        assert_eq!(manager.set_password("Secret1").unwrap(), SecretLocation::Primary);
        assert!(manager.has_password());
        assert!(manager.verify_password("Secret1"));
        assert!(!manager.verify_password("secret1"));
        assert!(!manager.verify_password(" Secret1"));
    }

    #[test]
    fn test_password_is_hashed() {
        let fx = Fixture::new();
        let mut manager = fx.manager();
        manager.set_password("Secret1").unwrap();

        let stored = String::from_utf8(fx.primary.get(PASSWORD_ACCOUNT).unwrap().unwrap()).unwrap();
        assert!(stored.starts_with("$argon2id$"));
        assert!(!stored.contains("Secret1"));
    }

    #[test]
    fn test_short_password_rejected() {
        let fx = Fixture::new();
        let mut manager = fx.manager();

        assert!(manager.set_password("abc").unwrap_err().is_validation());
        assert!(!manager.has_password());
        manager.set_password("abcd").unwrap();
    }

    #[test]
    fn test_fallback_when_primary_refuses() {
        let fx = Fixture::new();
        fx.primary.set_fail_writes(true);
        let mut manager = fx.manager();

        assert_eq!(manager.set_password("Secret1").unwrap(), SecretLocation::Fallback);
        assert!(fx.fallback.contains(PASSWORD_ACCOUNT));
        assert!(manager.verify_password("Secret1"));
    }

    #[test]
    fn test_fallback_write_shadows_stale_primary() {
        let fx = Fixture::new();
        let mut manager = fx.manager();
        assert_eq!(manager.set_password("OldOne").unwrap(), SecretLocation::Primary);

        fx.primary.set_fail_writes(true);
        assert_eq!(manager.set_password("NewOne").unwrap(), SecretLocation::Fallback);

        assert!(fx.primary.contains(PASSWORD_ACCOUNT));
        assert!(manager.verify_password("NewOne"));
        assert!(!manager.verify_password("OldOne"));

        let reopened = fx.manager();
        assert!(reopened.verify_password("NewOne"));
        assert!(!reopened.verify_password("OldOne"));
    }

    #[test]
    fn test_change_password_lands_in_fallback() {
        let fx = Fixture::new();
        let mut manager = fx.manager();
        manager.set_password("first").unwrap();

        fx.primary.set_fail_writes(true);
        manager.change_password("first", "second").unwrap();
        assert!(manager.verify_password("second"));

        fx.primary.set_fail_writes(false);
        manager.change_password("second", "third").unwrap();
        assert!(!fx.fallback.contains(PASSWORD_ACCOUNT));
        assert!(manager.verify_password("third"));
        assert!(!manager.verify_password("second"));
    }

    #[test]
    fn test_total_storage_failure() {
        let fx = Fixture::new();
        fx.primary.set_fail_writes(true);
        fx.fallback.set_fail_writes(true);
        let mut manager = fx.manager();

        let err = manager.set_password("Secret1").unwrap_err();
        assert!(matches!(err, MaterielError::SecretStorage(_)));
        assert!(!manager.has_password());
    }

    #[test]
    fn test_primary_write_clears_stale_fallback() {
        let fx = Fixture::new();
        fx.primary.set_fail_writes(true);
        let mut manager = fx.manager();
        manager.set_password("OldOne").unwrap();

        fx.primary.set_fail_writes(false);
        manager.set_password("NewOne").unwrap();

        assert!(!fx.fallback.contains(PASSWORD_ACCOUNT));
        assert!(manager.verify_password("NewOne"));
        assert!(!manager.verify_password("OldOne"));
    }

    #[test]
    fn test_change_password_requires_old() {
        let fx = Fixture::new();
        let mut manager = fx.manager();
        manager.set_password("first").unwrap();

        let err = manager.change_password("wrong", "second").unwrap_err();
        assert!(matches!(err, MaterielError::InvalidCredentials));
        assert!(manager.verify_password("first"));
        assert!(!manager.verify_password("second"));

        manager.change_password("first", "second").unwrap();
        assert!(manager.verify_password("second"));
        assert!(!manager.verify_password("first"));
    }

    #[test]
    fn test_recovery_answer_normalized() {
        let fx = Fixture::new();
        let mut manager = fx.manager();
        manager.set_password("Secret1").unwrap();
        manager
            .set_recovery_question("Nom du premier chien ?", "  Rex ")
            .unwrap();

        assert_eq!(manager.recovery_question(), Some("Nom du premier chien ?"));
        assert!(manager.verify_recovery_answer("rex"));
        assert!(manager.verify_recovery_answer("REX  "));
        assert!(!manager.verify_recovery_answer("Rexy"));
    }

    #[test]
    fn test_recovery_validation() {
        let fx = Fixture::new();
        let mut manager = fx.manager();

        assert!(manager.set_recovery_question("  ", "answer").is_err());
        assert!(manager.set_recovery_question("Question ?", " a ").is_err());
        assert!(manager.recovery_question().is_none());
    }

    #[test]
    fn test_reset_with_recovery() {
        let fx = Fixture::new();
        let mut manager = fx.manager();
        manager.set_password("forgotten").unwrap();
        manager.set_recovery_question("Ville ?", "Lyon").unwrap();

        assert!(manager.reset_password_with_recovery("Paris", "newpass").is_err());
        assert!(manager.verify_password("forgotten"));

        manager.reset_password_with_recovery("lyon", "newpass").unwrap();
        assert!(manager.verify_password("newpass"));
        assert!(!manager.verify_password("forgotten"));
    }

    #[test]
    fn test_remove_password() {
        let fx = Fixture::new();
        let mut manager = fx.manager();
        manager.set_password("Secret1").unwrap();
        manager.set_recovery_question("Ville ?", "Lyon").unwrap();

        manager.remove_password().unwrap();

        assert!(!manager.has_password());
        assert!(manager.recovery_question().is_none());
        assert!(!manager.verify_password("Secret1"));
        assert!(fx.primary.is_empty());
        assert!(fx.fallback.is_empty());
    }

    #[test]
    fn test_state_persists() {
        let fx = Fixture::new();
        {
            let mut manager = fx.manager();
            manager.set_password("Secret1").unwrap();
            manager.set_recovery_question("Ville ?", "Lyon").unwrap();
        }

        let reopened = fx.manager();
        assert!(reopened.has_password());
        assert_eq!(reopened.recovery_question(), Some("Ville ?"));
        assert!(reopened.verify_password("Secret1"));
    }

    #[test]
    fn test_content_key_survives_password_reset() {
        let fx = Fixture::new();
        let mut manager = fx.manager();
        manager.set_password("first").unwrap();
        manager.set_recovery_question("Chien ?", "Rex").unwrap();
        let key = manager.content_key().unwrap();

        manager.change_password("first", "second").unwrap();
        manager.reset_password_with_recovery("rex", "third").unwrap();

        assert_eq!(manager.content_key().unwrap().as_bytes(), key.as_bytes());
        assert!(fx.primary.contains(CONTENT_KEY_ACCOUNT));
    }

    #[test]
    fn test_content_key_is_stable() {
        let fx = Fixture::new();
        let mut manager = fx.manager();

        let first = manager.content_key().unwrap();
        let second = manager.content_key().unwrap();
        assert_eq!(first.as_bytes(), second.as_bytes());

        manager.remove_content_key().unwrap();
        let third = manager.content_key().unwrap();
        assert_ne!(first.as_bytes(), third.as_bytes());
    }

    #[test]
    fn test_open_with_files() {
        let dir = TempDir::new().unwrap();
        let paths = MaterielPaths::with_base_dir(dir.path().to_path_buf());
        let mut manager = PasswordManager::open(&paths, HashParams::with_values(1024, 1, 1)).unwrap();

        assert_eq!(manager.set_password("Secret1").unwrap(), SecretLocation::Primary);
        assert!(paths.keystore_file().exists());

        let reopened = PasswordManager::open(&paths, HashParams::with_values(1024, 1, 1)).unwrap();
        assert!(reopened.verify_password("Secret1"));
    }
}
