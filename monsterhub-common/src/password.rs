//! Password hashing for registry entries.
//!
//! Hashes are stored as argon2id PHC strings, which carry their own salt
//! and cost parameters, so verification never needs the hasher's current
//! configuration.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{self, PasswordHasher as _, PasswordVerifier as _, SaltString},
};
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Formatter};
use thiserror::Error;

pub const PASSWORD_SALT_LEN: usize = 16;

#[derive(Clone, Eq, PartialEq, Debug, Error)]
#[error("Hashing password failed: {0}")]
pub struct PasswordHashError(password_hash::Error);

#[derive(Clone, Eq, PartialEq, Debug, Error)]
#[error("Invalid argon2 parameters: {0}")]
pub struct InvalidHashCostError(argon2::Error);

#[derive(Clone, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(transparent)]
pub struct PasswordHash(String);

impl PasswordHash {
    #[must_use]
    pub fn as_phc_str(&self) -> &str {
        &self.0
    }

    /// Returns false for a wrong password as well as for a stored hash that
    /// cannot be parsed.
    #[must_use]
    pub fn verify(&self, password: &str) -> bool {
        let Ok(parsed) = password_hash::PasswordHash::new(&self.0) else {
            return false;
        };

        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }
}

impl Debug for PasswordHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("PasswordHash").field(&"[redacted]").finish()
    }
}

/// Cost settings for new hashes.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
pub struct HashCost {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for HashCost {
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

impl HashCost {
    /// The cheapest settings argon2 accepts. Only meant for tests.
    #[must_use]
    pub fn minimal() -> Self {
        Self {
            memory_kib: Params::MIN_M_COST,
            iterations: Params::MIN_T_COST,
            parallelism: Params::MIN_P_COST,
        }
    }
}

#[derive(Clone)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
}

impl PasswordHasher {
    pub fn new(cost: HashCost) -> Result<Self, InvalidHashCostError> {
        let params = Params::new(cost.memory_kib, cost.iterations, cost.parallelism, None)
            .map_err(InvalidHashCostError)?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    pub fn hash(&self, password: &str) -> Result<PasswordHash, PasswordHashError> {
        let salt_bytes: [u8; PASSWORD_SALT_LEN] = rand::random();
        let salt = SaltString::encode_b64(&salt_bytes).map_err(PasswordHashError)?;

        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(PasswordHashError)?;

        Ok(PasswordHash(hash.to_string()))
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self {
            argon2: Argon2::default(),
        }
    }
}

impl Debug for PasswordHasher {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordHasher").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use crate::password::{HashCost, PasswordHasher};

    fn hasher() -> PasswordHasher {
        PasswordHasher::new(HashCost::minimal()).unwrap()
    }

    #[test]
    fn verify_round() {
        let hash = hasher().hash("pw1").unwrap();

        assert!(hash.verify("pw1"));
        assert!(!hash.verify("pw2"));
        assert!(!hash.verify(""));
    }

    #[test]
    fn hash_is_salted_and_never_plaintext() {
        let hasher = hasher();
        let first = hasher.hash("pw1").unwrap();
        let second = hasher.hash("pw1").unwrap();

        assert_ne!(first, second);
        assert!(first.as_phc_str().starts_with("$argon2id$"));
        assert!(!first.as_phc_str().contains("pw1"));
        assert_eq!(format!("{first:?}"), "PasswordHash(\"[redacted]\")");
    }

    #[test]
    fn garbage_hash_never_verifies() {
        let hash: crate::password::PasswordHash = serde_json::from_str("\"pw1\"").unwrap();

        assert!(!hash.verify("pw1"));
    }

    #[test]
    fn invalid_cost_is_rejected() {
        let cost = HashCost {
            memory_kib: 0,
            ..HashCost::minimal()
        };

        assert!(PasswordHasher::new(cost).is_err());
    }
}
