//! Manage json web tokens.

use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, ServerError};
use crate::user::{Caller, Role};

pub const EXPIRATION_TIME: u64 = 60 * 60 * 24 * 7; // 7 days, in seconds.

/// Pieces of information asserted on a JWT.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Recipients that the JWT is intended for.
    pub aud: String,
    /// Identifies the expiration time on or after which the JWT must not be
    /// accepted for processing.
    pub exp: u64,
    /// Identifies the time at which the JWT was issued.
    pub iat: u64,
    /// Identifies the organization that issued the JWT.
    pub iss: String,
    /// User ID.
    pub sub: String,
    /// Role granted to the user at issuance.
    pub role: Role,
}

/// Manage JWT tokens.
#[derive(Clone)]
pub struct TokenManager {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    name: String,
    audience: String,
}

impl TokenManager {
    /// Create a new [`TokenManager`] instance.
    pub fn new(name: &str, secret: &str) -> Self {
        Self {
            algorithm: Algorithm::HS256,
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            name: name.to_owned(),
            audience: name.to_owned(),
        }
    }

    /// Set `audience` field on JWT.
    pub fn audience(&mut self, audience: &str) {
        self.audience = audience.to_owned();
    }

    /// Create a new token for a user.
    pub fn create(&self, user_id: Uuid, role: Role) -> Result<String> {
        let time = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|err| ServerError::internal("system clock error", err))?
            .as_secs();
        let header = Header::new(self.algorithm);
        let claims = Claims {
            aud: self.audience.clone(),
            exp: time + EXPIRATION_TIME,
            iat: time,
            iss: self.name.clone(),
            sub: user_id.to_string(),
            role,
        };

        encode(&header, &claims, &self.encoding_key)
            .map_err(|err| ServerError::internal("cannot sign token", err))
    }

    /// Decode and check a token, resolving the caller behind it.
    pub fn decode(&self, token: &str) -> Result<Caller> {
        let mut validation = Validation::new(self.algorithm);
        validation.set_audience(&[&self.audience]);

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|_| ServerError::Unauthorized)?
            .claims;

        let id = Uuid::parse_str(&claims.sub)
            .map_err(|_| ServerError::Unauthorized)?;

        Ok(Caller {
            id,
            role: claims.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_decode_roundtrip() {
        let manager = TokenManager::new("studentport", "test-secret");
        let id = Uuid::new_v4();

        let token = manager.create(id, Role::Student).unwrap();
        let caller = manager.decode(&token).unwrap();

        assert_eq!(caller.id, id);
        assert_eq!(caller.role, Role::Student);
    }

    #[test]
    fn test_decode_refuses_foreign_signature() {
        let manager = TokenManager::new("studentport", "test-secret");
        let other = TokenManager::new("studentport", "another-secret");

        let token = other.create(Uuid::new_v4(), Role::SuperAdmin).unwrap();
        assert!(manager.decode(&token).is_err());
    }

    #[test]
    fn test_decode_refuses_garbage() {
        let manager = TokenManager::new("studentport", "test-secret");
        assert!(manager.decode("not.a.token").is_err());
    }
}
