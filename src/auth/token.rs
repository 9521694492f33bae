//! Signed identity tokens gating the editor and the live link.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// How long an issued token stays valid.
pub const TOKEN_TTL_HOURS: i64 = 24;

/// Seconds of clock skew tolerated when checking `exp`.
const LEEWAY_SECS: u64 = 5;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("No session token presented")]
    Missing,
    #[error("Invalid token: {0}")]
    Invalid(String),
    #[error("Token has expired")]
    Expired,
    #[error("Failed to issue token: {0}")]
    Issue(String),
}

/// Identity claim carried by every token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub username: String,
    /// Issued-at (seconds since epoch)
    pub iat: i64,
    /// Expiration (seconds since epoch)
    pub exp: i64,
}

/// Issues and validates HS256 tokens with a process-wide secret.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl TokenIssuer {
    pub fn new(secret: &str) -> Self {
        Self::with_ttl(secret, Duration::hours(TOKEN_TTL_HOURS))
    }

    pub fn with_ttl(secret: &str, ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = LEEWAY_SECS;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        }
    }

    /// Issue a token for `username`, valid for the configured window from now.
    pub fn issue(&self, username: &str) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            username: username.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Issue(e.to_string()))
    }

    /// Verify signature and expiry, returning the embedded claims.
    pub fn validate(&self, token: &str) -> Result<Claims, AuthError> {
        let token_data =
            decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
                match e.kind() {
                    ErrorKind::ExpiredSignature => AuthError::Expired,
                    _ => AuthError::Invalid(e.to_string()),
                }
            })?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_validates_to_same_username() {
        let issuer = TokenIssuer::new("secret");
        let token = issuer.issue("alice").unwrap();

        let claims = issuer.validate(&token).unwrap();
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.exp - claims.iat, TOKEN_TTL_HOURS * 3600);
    }

    #[test]
    fn validation_is_idempotent() {
        let issuer = TokenIssuer::new("secret");
        let token = issuer.issue("bob").unwrap();

        let first = issuer.validate(&token).unwrap();
        let second = issuer.validate(&token).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn expired_token_is_rejected_as_expired() {
        let issuer = TokenIssuer::with_ttl("secret", Duration::hours(-1));
        let token = issuer.issue("carol").unwrap();

        assert_eq!(issuer.validate(&token), Err(AuthError::Expired));
    }

    #[test]
    fn token_signed_with_another_secret_is_invalid() {
        let token = TokenIssuer::new("one").issue("dave").unwrap();

        let err = TokenIssuer::new("two").validate(&token).unwrap_err();
        assert!(matches!(err, AuthError::Invalid(_)));
    }

    #[test]
    fn garbage_is_invalid() {
        let err = TokenIssuer::new("secret").validate("not-a-jwt").unwrap_err();
        assert!(matches!(err, AuthError::Invalid(_)));
    }
}
