//! Secret hashing using Argon2id
//!
//! The vault never stores the password or the recovery answer in clear. Both
//! are kept as Argon2id PHC strings and checked with a constant-time verify.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, Params,
};
use serde::{Deserialize, Serialize};

use crate::error::{MaterielError, MaterielResult};

/// Cost parameters for Argon2id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashParams {
    /// Memory cost in KiB (default: 19456 = 19 MiB)
    pub memory_cost: u32,
    /// Time cost (iterations, default: 2)
    pub time_cost: u32,
    /// Parallelism degree (default: 1)
    pub parallelism: u32,
}

impl Default for HashParams {
    fn default() -> Self {
        Self {
            memory_cost: 19456,
            time_cost: 2,
            parallelism: 1,
        }
    }
}

impl HashParams {
    /// Create params with specific values
    pub fn with_values(memory_cost: u32, time_cost: u32, parallelism: u32) -> Self {
        Self {
            memory_cost,
            time_cost,
            parallelism,
        }
    }

    fn argon2(&self) -> MaterielResult<Argon2<'static>> {
        let params = Params::new(self.memory_cost, self.time_cost, self.parallelism, None)
            .map_err(|e| MaterielError::Encryption(format!("Invalid Argon2 parameters: {}", e)))?;

        Ok(Argon2::new(
            argon2::Algorithm::Argon2id,
            argon2::Version::V0x13,
            params,
        ))
    }
}

/// Hash a secret into a PHC string with a fresh random salt
pub fn hash_secret(secret: &str, params: &HashParams) -> MaterielResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = params
        .argon2()?
        .hash_password(secret.as_bytes(), &salt)
        .map_err(|e| MaterielError::Encryption(format!("Hashing failed: {}", e)))?;

    Ok(hash.to_string())
}

/// Check a candidate against a stored PHC string
///
/// The cost parameters are read back from the PHC string, so hashes created
/// with older settings keep verifying. A malformed hash never matches.
pub fn verify_secret(candidate: &str, phc: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(phc) else {
        return false;
    };

    Argon2::default()
        .verify_password(candidate.as_bytes(), &parsed)
        .is_ok()
}
