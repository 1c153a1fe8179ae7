//! Password-protected vault
//!
//! The vault holds sensitive documents (invoices, photos proving ownership)
//! behind a password. [`VaultSession`] drives the lock screen, recovery and
//! full reset flows; [`PasswordManager`] owns the secrets; secrets are kept
//! in a [`SecretStore`], the encrypted keystore file first and the encoded
//! preferences file second.

pub mod biometric;
pub mod documents;
pub mod fallback;
pub mod keystore;
pub mod password;
pub mod secret_store;
pub mod session;

pub use biometric::{BiometricAuthenticator, NoBiometrics};
pub use documents::{DocumentVault, NewDocument};
pub use fallback::EncodedFallbackStore;
pub use keystore::KeystoreFile;
pub use password::{PasswordManager, SecretLocation, MIN_ANSWER_LENGTH, MIN_PASSWORD_LENGTH};
pub use secret_store::{MemorySecretStore, SecretStore, SecretStoreError, VAULT_SERVICE};
pub use session::{
    RecoveryStep, RecoverySetup, ResetStep, SessionState, VaultSession, RESET_CONFIRMATION,
};
