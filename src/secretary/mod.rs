//! Credential sealing and bearer-token issuance.
//!
//! The secretary owns the symmetric key material: it deterministically seals
//! logins and passwords for at-rest storage, and it mints and validates the
//! HS256 tokens returned by register/login. Everything else in the crate
//! treats both operations as opaque codecs.

use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// Token lifetime.
const TOKEN_TTL_MINUTES: i64 = 30;

#[derive(Debug, Error)]
pub enum SecretaryError {
    #[error("invalid access token")]
    InvalidToken,
    #[error("token encoding failed: {0}")]
    Encoding(#[from] jsonwebtoken::errors::Error),
}

/// JWT claims: `sub` carries the user id.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

pub struct Secretary {
    key: Vec<u8>,
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl Secretary {
    /// Derives the working key from the configured secret.
    pub fn new(secret_key: &str) -> Self {
        let key = Sha256::digest(secret_key.as_bytes()).to_vec();
        Self {
            encoding: EncodingKey::from_secret(&key),
            decoding: DecodingKey::from_secret(&key),
            key,
        }
    }

    /// Deterministically seals a credential for at-rest storage and lookup.
    pub fn seal(&self, data: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(&self.key).expect("HMAC accepts any key length");
        mac.update(data.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Mints a fresh user id together with a token bound to it.
    pub fn new_token(&self) -> Result<(String, String), SecretaryError> {
        let user_id = Uuid::new_v4().to_string();
        let token = self.token_for_user(&user_id)?;
        Ok((token, user_id))
    }

    /// Issues a token for an existing user id.
    pub fn token_for_user(&self, user_id: &str) -> Result<String, SecretaryError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_owned(),
            iat: now.timestamp(),
            exp: (now + Duration::minutes(TOKEN_TTL_MINUTES)).timestamp(),
        };
        Ok(encode(&Header::default(), &claims, &self.encoding)?)
    }

    /// Validates a bearer token and extracts the user id bound to it.
    pub fn verify_token(&self, token: &str) -> Result<String, SecretaryError> {
        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|_| SecretaryError::InvalidToken)?;
        Ok(data.claims.sub)
    }
}
