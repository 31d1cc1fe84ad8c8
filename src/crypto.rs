//! Cryptographic logics.

use argon2::password_hash::{
    PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::rngs::OsRng;

use crate::config::Argon2 as ArgonConfig;

type Result<T> = std::result::Result<T, CryptoError>;

#[derive(thiserror::Error, Debug)]
pub enum CryptoError {
    #[error("argon2 error: {0}")]
    Argon2(String),
}

/// Password hashing manager.
///
/// Hashes are stored as PHC strings, so parameter changes only affect
/// newly created hashes.
pub struct PasswordManager {
    argon2: Argon2<'static>,
}

impl PasswordManager {
    /// Create a new [`PasswordManager`].
    pub fn new(config: Option<ArgonConfig>) -> Result<Self> {
        let config = config.unwrap_or_default();
        let params = Params::new(
            config.memory_cost,
            config.iterations,
            config.parallelism,
            Some(config.hash_length),
        )
        .map_err(|e| CryptoError::Argon2(e.to_string()))?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Hash a password into a PHC string with a random salt.
    pub fn hash_password(&self, password: impl AsRef<[u8]>) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);

        Ok(self
            .argon2
            .hash_password(password.as_ref(), &salt)
            .map_err(|e| CryptoError::Argon2(e.to_string()))?
            .to_string())
    }

    /// Check a password against a stored PHC string.
    ///
    /// A mismatch is `Ok(false)`; only malformed hashes are errors.
    pub fn verify_password(
        &self,
        password: impl AsRef<[u8]>,
        phc_string: &str,
    ) -> Result<bool> {
        let parsed = PasswordHash::new(phc_string)
            .map_err(|e| CryptoError::Argon2(e.to_string()))?;

        Ok(self
            .argon2
            .verify_password(password.as_ref(), &parsed)
            .is_ok())
    }
}

impl From<CryptoError> for crate::error::ServerError {
    fn from(err: CryptoError) -> Self {
        crate::error::ServerError::internal("password hashing failed", err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> PasswordManager {
        // low-cost parameters, hashing speed only matters in production.
        PasswordManager::new(Some(ArgonConfig {
            memory_cost: 1024,
            iterations: 1,
            parallelism: 1,
            hash_length: 32,
        }))
        .unwrap()
    }

    #[test]
    fn test_hash_and_verify() {
        let pwd = manager();
        let hash = pwd.hash_password("P$soW%920$n&").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(pwd.verify_password("P$soW%920$n&", &hash).unwrap());
        assert!(!pwd.verify_password("wrong-password", &hash).unwrap());
    }

    #[test]
    fn test_verify_rejects_malformed_hash() {
        let pwd = manager();
        assert!(pwd.verify_password("whatever", "not-a-phc-string").is_err());
    }
}
