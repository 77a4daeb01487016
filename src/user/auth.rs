//! Password hashing and bearer token issuance.

use super::UserId;
use anyhow::{anyhow, Context, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

mod argon2_hasher {
    use anyhow::{anyhow, Result};
    use argon2::{
        password_hash::{
            rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
        },
        Argon2,
    };

    #[cfg(not(feature = "test-fast-hasher"))]
    fn argon2() -> Argon2<'static> {
        Argon2::default()
    }

    #[cfg(feature = "test-fast-hasher")]
    fn argon2() -> Argon2<'static> {
        let params = argon2::Params::new(256, 1, 1, None).unwrap_or_default();
        Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params)
    }

    /// PHC string, salt included.
    pub fn hash(plain: &[u8]) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash_string = argon2()
            .hash_password(plain, &salt)
            .map_err(|err| anyhow!("{}", err))?
            .to_string();
        Ok(hash_string)
    }

    pub fn verify<T: AsRef<str>>(plain_pw: &[u8], target_hash: T) -> Result<bool> {
        let password_hash =
            PasswordHash::new(target_hash.as_ref()).map_err(|err| anyhow!("{}", err))?;
        Ok(argon2().verify_password(plain_pw, &password_hash).is_ok())
    }
}

pub fn hash_password(plain: &str) -> Result<String> {
    argon2_hasher::hash(plain.as_bytes())
}

/// False on a mismatch, Err only if the stored hash is unreadable.
pub fn verify_password(plain: &str, stored_hash: &str) -> Result<bool> {
    argon2_hasher::verify(plain.as_bytes(), stored_hash)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    pub kind: TokenKind,
    pub iat: i64,
    pub exp: i64,
}

impl TokenClaims {
    pub fn user_id(&self) -> Option<UserId> {
        self.sub.parse().ok()
    }
}

/// Signs and checks HS256 tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_lifetime: Duration,
    refresh_lifetime: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &str, access_lifetime: Duration, refresh_lifetime: Duration) -> Self {
        TokenIssuer {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_lifetime,
            refresh_lifetime,
        }
    }

    pub fn issue(&self, user_id: UserId, kind: TokenKind) -> Result<String> {
        let lifetime = match kind {
            TokenKind::Access => self.access_lifetime,
            TokenKind::Refresh => self.refresh_lifetime,
        };
        let now = Utc::now();
        let claims = TokenClaims {
            sub: user_id.to_string(),
            kind,
            iat: now.timestamp(),
            exp: (now + lifetime).timestamp(),
        };
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .context("Failed to sign token")
    }

    /// Checks signature and expiry, then that the token is of the `expected` kind.
    pub fn verify(&self, token: &str, expected: TokenKind) -> Result<UserId> {
        let data = jsonwebtoken::decode::<TokenClaims>(
            token,
            &self.decoding_key,
            &Validation::new(Algorithm::HS256),
        )?;
        if data.claims.kind != expected {
            return Err(anyhow!("Expected a {:?} token", expected));
        }
        data.claims
            .user_id()
            .ok_or_else(|| anyhow!("Invalid token subject {}", data.claims.sub))
    }
}
