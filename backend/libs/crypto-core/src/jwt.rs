/// Access token signing and validation
///
/// Tokens are HS256-signed with a shared secret that is loaded once at startup
/// and carried around in a [`JwtKeys`] value. Only `access` tokens are accepted
/// by [`JwtKeys::validate_token`].
///
/// ```rust
/// use crypto_core::jwt::JwtKeys;
///
/// let keys = JwtKeys::from_secret(b"local-dev-secret", 3600);
/// let token = keys.issue_access_token(42, "leo").unwrap();
/// assert_eq!(keys.user_id_from_token(&token).unwrap(), 42);
/// ```
use anyhow::{anyhow, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, Algorithm, DecodingKey, EncodingKey, Header, TokenData, Validation,
};
use serde::{Deserialize, Serialize};
use std::fmt;

const JWT_ALGORITHM: Algorithm = Algorithm::HS256;
const ACCESS_TOKEN_TYPE: &str = "access";

/// Claims carried by an access token
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (numeric user id as a string)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    pub token_type: String,
    pub username: String,
}

/// Signing material plus the lifetime applied to newly issued tokens.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl: Duration,
}

impl fmt::Debug for JwtKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtKeys")
            .field("secret", &"[REDACTED]")
            .field("access_ttl_secs", &self.access_ttl.num_seconds())
            .finish()
    }
}

impl JwtKeys {
    pub fn from_secret(secret: &[u8], access_ttl_secs: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            access_ttl: Duration::seconds(access_ttl_secs),
        }
    }

    pub fn issue_access_token(&self, user_id: i64, username: &str) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + self.access_ttl).timestamp(),
            token_type: ACCESS_TOKEN_TYPE.to_string(),
            username: username.to_string(),
        };

        encode(&Header::new(JWT_ALGORITHM), &claims, &self.encoding)
            .map_err(|e| anyhow!("Failed to generate access token: {e}"))
    }

    /// Verify signature and expiry, and require an access token.
    pub fn validate_token(&self, token: &str) -> Result<TokenData<Claims>> {
        let mut validation = Validation::new(JWT_ALGORITHM);
        validation.validate_exp = true;
        validation.leeway = 0;

        let data = decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|e| anyhow!("Token validation failed: {e}"))?;

        if data.claims.token_type != ACCESS_TOKEN_TYPE {
            return Err(anyhow!(
                "Unexpected token type: {}",
                data.claims.token_type
            ));
        }
        Ok(data)
    }

    /// Validate `token` and parse its subject as a user id.
    pub fn user_id_from_token(&self, token: &str) -> Result<i64> {
        let data = self.validate_token(token)?;
        data.claims
            .sub
            .parse()
            .map_err(|e| anyhow!("Invalid user ID format in token: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> JwtKeys {
        JwtKeys::from_secret(b"unit-test-secret", 3600)
    }

    #[test]
    fn test_issue_and_validate() {
        let keys = keys();
        let token = keys.issue_access_token(7, "leo").unwrap();
        assert_eq!(token.matches('.').count(), 2);

        let data = keys.validate_token(&token).unwrap();
        assert_eq!(data.claims.sub, "7");
        assert_eq!(data.claims.username, "leo");
        assert_eq!(data.claims.token_type, "access");
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = keys().issue_access_token(7, "leo").unwrap();
        let other = JwtKeys::from_secret(b"another-secret", 3600);
        assert!(other.validate_token(&token).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let keys = JwtKeys::from_secret(b"unit-test-secret", -120);
        let token = keys.issue_access_token(7, "leo").unwrap();
        assert!(keys.validate_token(&token).is_err());
    }

    #[test]
    fn test_debug_hides_secret() {
        let rendered = format!("{:?}", keys());
        assert!(rendered.contains("[REDACTED]"));
        assert!(!rendered.contains("unit-test-secret"));
    }
}
