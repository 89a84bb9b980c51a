use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// User id, stringified
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Error, Debug)]
pub enum TokenError {
    #[error("token rejected: {0}")]
    Rejected(#[from] jsonwebtoken::errors::Error),

    #[error("token subject `{0}` is not a user id")]
    BadSubject(String),

    #[error("token lifetime out of range")]
    Lifetime,
}

/// Issues and verifies HS256 bearer tokens.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenService {
    #[must_use]
    pub fn new(secret: &SecretString, ttl: Duration) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
            validation,
            ttl,
        }
    }

    /// Sign a token for `user_id` valid for the configured lifetime.
    ///
    /// # Errors
    /// Returns an error if the lifetime overflows or signing fails.
    pub fn issue(&self, user_id: i32) -> Result<String, TokenError> {
        let ttl = chrono::Duration::from_std(self.ttl).map_err(|_| TokenError::Lifetime)?;
        let expires_at = Utc::now()
            .checked_add_signed(ttl)
            .ok_or(TokenError::Lifetime)?;
        self.issue_until(user_id, expires_at)
    }

    /// Sign a token for `user_id` that expires at `expires_at`.
    ///
    /// # Errors
    /// Returns an error if signing fails.
    pub fn issue_until(&self, user_id: i32, expires_at: DateTime<Utc>) -> Result<String, TokenError> {
        let claims = Claims {
            sub: user_id.to_string(),
            iat: Utc::now().timestamp(),
            exp: expires_at.timestamp(),
        };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
    }

    /// Check signature and expiry, returning the embedded user id.
    ///
    /// # Errors
    /// Returns an error for malformed, tampered or expired tokens.
    pub fn verify(&self, token: &str) -> Result<i32, TokenError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation)?;
        data.claims
            .sub
            .parse::<i32>()
            .map_err(|_| TokenError::BadSubject(data.claims.sub))
    }
}

/// Extract the token from an `Authorization` value using the bearer scheme.
/// The scheme name is case-insensitive; anything else yields `None`.
#[must_use]
pub fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(secret: &str) -> TokenService {
        TokenService::new(
            &SecretString::from(secret.to_string()),
            Duration::from_secs(3600),
        )
    }

    #[test]
    fn test_issue_and_verify() {
        let tokens = service("alpha");
        let token = tokens.issue(42).unwrap();
        assert_eq!(tokens.verify(&token).unwrap(), 42);
    }

    #[test]
    fn test_rejects_wrong_secret() {
        let token = service("alpha").issue(42).unwrap();
        assert!(service("beta").verify(&token).is_err());
    }

    #[test]
    fn test_rejects_expired() {
        let tokens = service("alpha");
        let token = tokens
            .issue_until(42, Utc::now() - chrono::Duration::hours(1))
            .unwrap();
        assert!(tokens.verify(&token).is_err());
    }

    #[test]
    fn test_rejects_tampered_payload() {
        let tokens = service("alpha");
        let token = tokens.issue(42).unwrap();
        let other = tokens.issue(7).unwrap();

        // Splice user 7's payload onto user 42's signature.
        let parts: Vec<&str> = token.split('.').collect();
        let other_parts: Vec<&str> = other.split('.').collect();
        let forged = format!("{}.{}.{}", parts[0], other_parts[1], parts[2]);

        assert!(tokens.verify(&forged).is_err());
        assert!(tokens.verify("garbage").is_err());
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(bearer_token("bearer   abc"), Some("abc"));
        assert_eq!(bearer_token("Basic dXNlcjpwYXNz"), None);
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("abc"), None);
        assert_eq!(bearer_token(""), None);
    }
}
