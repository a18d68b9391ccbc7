//! JWT encoding, decoding and signature verification.
//!
//! The codec only answers "is this string a token we signed, and what does it
//! say". Expiry is checked separately with [`is_expired`] so that callers
//! control the clock and can tell an expired token apart from a forged one.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Token type for distinguishing access vs refresh tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    /// Short-lived token presented on every API call
    Access,
    /// Long-lived token only accepted by the refresh endpoint
    Refresh,
}

/// Claims carried by every token we sign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (account email)
    pub sub: String,
    /// Granted authorities. Empty on refresh tokens.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authorities: Vec<String>,
    /// Token type
    #[serde(rename = "typ")]
    pub token_type: TokenType,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
    /// Token ID, set on refresh tokens so that each one is unique
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
}

impl TokenClaims {
    /// Claims for an access token valid for `ttl` seconds from `now`.
    pub fn access(subject: &str, authorities: Vec<String>, now: u64, ttl: u64) -> Self {
        Self {
            sub: subject.to_string(),
            authorities,
            token_type: TokenType::Access,
            iat: now,
            exp: now.saturating_add(ttl),
            jti: None,
        }
    }

    /// Claims for a refresh token valid for `ttl` seconds from `now`.
    /// Carries the subject only, plus a random JTI.
    pub fn refresh(subject: &str, now: u64, ttl: u64) -> Self {
        Self {
            sub: subject.to_string(),
            authorities: Vec::new(),
            token_type: TokenType::Refresh,
            iat: now,
            exp: now.saturating_add(ttl),
            jti: Some(uuid::Uuid::new_v4().to_string()),
        }
    }
}

/// Errors that can occur during token operations.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// Not a parseable token (bad segments, base64, JSON or missing claims)
    #[error("token is malformed")]
    Malformed,
    /// Signature does not match the payload, or was made with another algorithm
    #[error("token signature is invalid")]
    InvalidSignature,
    /// Signature is fine but the token is past its expiry
    #[error("token has expired")]
    Expired,
    /// Refresh token presented as access token or vice versa
    #[error("wrong token type")]
    WrongTokenType,
    #[error("failed to encode token: {0}")]
    Encoding(#[source] jsonwebtoken::errors::Error),
    #[error("system time error")]
    Clock,
}

impl TokenError {
    fn from_decode(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => Self::InvalidSignature,
            _ => Self::Malformed,
        }
    }
}

/// Signs and verifies tokens with a server-held HMAC secret.
#[derive(Clone)]
pub struct TokenCodec {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    /// Create a codec for the given secret and HMAC algorithm.
    pub fn new(secret: &[u8], algorithm: Algorithm) -> Self {
        let mut validation = Validation::new(algorithm);
        validation.leeway = 0;
        // Expiry is judged by `is_expired` against a caller-supplied clock.
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            algorithm,
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Serialize and sign the claims.
    pub fn encode(&self, claims: &TokenClaims) -> Result<String, TokenError> {
        jsonwebtoken::encode(&Header::new(self.algorithm), claims, &self.encoding_key)
            .map_err(TokenError::Encoding)
    }

    /// Verify the signature and return the claims. Does not look at expiry.
    pub fn decode(&self, token: &str) -> Result<TokenClaims, TokenError> {
        jsonwebtoken::decode::<TokenClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(TokenError::from_decode)
    }
}

/// Whether the claims are expired at `now`. A token is already expired at
/// the exact second of its `exp`.
pub fn is_expired(claims: &TokenClaims, now: u64) -> bool {
    claims.exp <= now
}

/// Current Unix time in seconds.
pub fn current_timestamp() -> Result<u64, TokenError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|_| TokenError::Clock)
}
