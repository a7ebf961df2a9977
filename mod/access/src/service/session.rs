//! Credential hashing and bearer token issuance.

use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};

use crate::model::Claims;
use crate::service::{AccessError, AccessService};

/// Hash a plain password with argon2id.
pub fn hash_password(password: &str) -> Result<String, AccessError> {
    use argon2::Argon2;
    use password_hash::rand_core::OsRng;
    use password_hash::{PasswordHasher, SaltString};

    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AccessError::Internal(e.to_string()))
}

/// Verify a password against an argon2id hash.
pub fn verify_password(password: &str, hash: &str) -> bool {
    use argon2::Argon2;
    use password_hash::{PasswordHash, PasswordVerifier};

    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

impl AccessService {
    /// Issue a signed bearer token for a user id.
    ///
    /// Tokens are self-contained HS256 JWTs carrying only the subject
    /// and validity window. There is no server-side session record;
    /// a token stays valid until it expires.
    pub fn issue_token(&self, user_id: &str) -> Result<String, AccessError> {
        let iat = Utc::now().timestamp();
        let claims = Claims {
            sub: user_id.to_string(),
            iat,
            exp: iat + self.config.token_ttl,
        };
        jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| AccessError::Internal(e.to_string()))
    }

    /// Verify a bearer token's signature and expiry, returning its
    /// claims. Any decode failure maps to an authorization error.
    pub fn verify_token(&self, token: &str) -> Result<Claims, AccessError> {
        jsonwebtoken::decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|_| AccessError::Unauthorized("invalid or expired token".into()))
    }
}
