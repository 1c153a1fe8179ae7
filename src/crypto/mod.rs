//! Cryptographic functions for Materiel
//!
//! Provides Argon2id hashing for the vault password and recovery answer, and
//! AES-256-GCM encryption for the keystore and the vault documents.

pub mod encryption;
pub mod key_derivation;
pub mod secure_memory;

pub use encryption::{decrypt, encrypt, EncryptedData, SecretKey};
pub use key_derivation::{hash_secret, verify_secret, HashParams};
pub use secure_memory::SecureString;
