//! Bearer-token issuance and validation for the recommendation endpoint.
//!
//! Tokens are short-lived HS256 JWTs. Validation checks the signature and
//! expiry, nothing else; the gate has no side effects beyond pass/fail.
//! Issuance requires no prior authentication, so a token proves possession
//! of a valid credential, not an identity.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::errors::ApiError;
use crate::server::state::AppState;

/// Claims carried by an issued token.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    iat: i64,
    exp: i64,
}

/// Issues and validates the service's bearer tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenIssuer {
    /// Create an issuer for the given signing secret and token lifetime.
    pub fn new(secret: &str, ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // No leeway: a token is rejected the moment its expiry elapses.
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        }
    }

    /// Mint a signed token expiring after the configured lifetime.
    pub fn issue(&self) -> Result<String, ApiError> {
        let now = Utc::now();
        let claims = Claims {
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| ApiError::token_issue(e.to_string()))
    }

    /// Check the signature and expiry of a presented token.
    pub fn validate(&self, token: &str) -> Result<(), ApiError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|_| ())
            .map_err(|_| ApiError::unauthorized("invalid or expired token"))
    }
}

/// Require a valid bearer token before delegating to the wrapped handler.
pub async fn require_bearer(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header_value = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| ApiError::unauthorized("missing bearer token"))?;

    let token = header_value
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::unauthorized("malformed authorization header"))?;

    state.tokens.validate(token)?;
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer(ttl: Duration) -> TokenIssuer {
        TokenIssuer::new("test-secret", ttl)
    }

    #[test]
    fn test_issued_token_validates() {
        let tokens = issuer(Duration::minutes(5));
        let token = tokens.issue().unwrap();
        assert!(tokens.validate(&token).is_ok());
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let tokens = issuer(Duration::seconds(-5));
        let token = tokens.issue().unwrap();
        assert!(matches!(
            tokens.validate(&token),
            Err(ApiError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = issuer(Duration::minutes(5)).issue().unwrap();
        let other = TokenIssuer::new("another-secret", Duration::minutes(5));
        assert!(other.validate(&token).is_err());
    }

    #[test]
    fn test_garbage_token_is_rejected() {
        let tokens = issuer(Duration::minutes(5));
        assert!(tokens.validate("not-a-jwt").is_err());
        assert!(tokens.validate("").is_err());
    }
}
