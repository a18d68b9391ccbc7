//! Issues, validates and rotates access/refresh token pairs.
//!
//! Access tokens are short-lived and stateless: they carry the subject and its
//! authorities and are trusted on signature and expiry alone. Refresh tokens
//! are long-lived, carry only the subject, and are accepted only while they
//! match the single refresh token stored on the account.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::errors::AuthError;
use super::types::Identity;
use crate::jwt::{TokenClaims, TokenCodec, TokenError, TokenType, current_timestamp, is_expired};

/// Default access token duration: 5 minutes
pub const ACCESS_TOKEN_DURATION_SECS: u64 = 5 * 60;

/// Default refresh token duration: 2 weeks
pub const REFRESH_TOKEN_DURATION_SECS: u64 = 14 * 24 * 60 * 60;

/// Token lifetimes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenSettings {
    pub access_ttl_secs: u64,
    pub refresh_ttl_secs: u64,
}

impl Default for TokenSettings {
    fn default() -> Self {
        Self {
            access_ttl_secs: ACCESS_TOKEN_DURATION_SECS,
            refresh_ttl_secs: REFRESH_TOKEN_DURATION_SECS,
        }
    }
}

/// Tokens handed to a client after login or refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Expiry of the access token (Unix timestamp)
    pub access_token_expiry: u64,
}

#[derive(Debug, Clone)]
pub struct TokenProvider {
    codec: TokenCodec,
    settings: TokenSettings,
}

impl TokenProvider {
    pub fn new(codec: TokenCodec, settings: TokenSettings) -> Self {
        Self { codec, settings }
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Issue a fresh access/refresh pair for an authenticated identity.
    pub fn issue_token_pair(&self, identity: &Identity) -> Result<TokenPair, AuthError> {
        let now = current_timestamp().map_err(AuthError::Token)?;
        self.issue_token_pair_at(identity, now)
    }

    pub fn issue_token_pair_at(&self, identity: &Identity, now: u64) -> Result<TokenPair, AuthError> {
        let access = TokenClaims::access(
            &identity.subject,
            identity.authorities.iter().cloned().collect(),
            now,
            self.settings.access_ttl_secs,
        );
        let refresh = TokenClaims::refresh(&identity.subject, now, self.settings.refresh_ttl_secs);

        Ok(TokenPair {
            access_token: self.codec.encode(&access).map_err(AuthError::Token)?,
            refresh_token: self.codec.encode(&refresh).map_err(AuthError::Token)?,
            access_token_expiry: access.exp,
        })
    }

    /// Verify an access token at `now`, reporting why it was rejected.
    pub fn check_access_token(&self, token: &str, now: u64) -> Result<TokenClaims, TokenError> {
        let claims = self.codec.decode(token)?;
        if claims.token_type != TokenType::Access {
            return Err(TokenError::WrongTokenType);
        }
        if is_expired(&claims, now) {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }

    /// True only for a correctly signed, unexpired access token.
    pub fn validate_access_token(&self, token: &str) -> bool {
        match current_timestamp() {
            Ok(now) => self.validate_access_token_at(token, now),
            Err(_) => false,
        }
    }

    pub fn validate_access_token_at(&self, token: &str, now: u64) -> bool {
        match self.check_access_token(token, now) {
            Ok(_) => true,
            Err(TokenError::InvalidSignature) => {
                warn!(
                    security_event = "invalid_signature",
                    "Rejected access token with invalid signature"
                );
                false
            }
            Err(TokenError::WrongTokenType) => {
                warn!(
                    security_event = "wrong_token_type",
                    "Rejected non-access token presented as access token"
                );
                false
            }
            Err(e) => {
                debug!(reason = %e, "Rejected access token");
                false
            }
        }
    }

    /// Build the identity carried by an access token. The caller is expected
    /// to have validated the token first.
    pub fn get_authentication(&self, token: &str) -> Result<Identity, AuthError> {
        let claims = self.codec.decode(token).map_err(AuthError::Decode)?;
        if claims.token_type != TokenType::Access {
            return Err(AuthError::Decode(TokenError::WrongTokenType));
        }
        Ok(Identity::from_claims(claims))
    }

    /// Subject of a correctly signed refresh token, regardless of expiry.
    pub fn refresh_subject(&self, refresh_token: &str) -> Result<String, AuthError> {
        self.decode_refresh(refresh_token).map(|claims| claims.sub)
    }

    /// Exchange a refresh token for a new pair. The caller must persist the
    /// returned refresh token, replacing `stored`.
    pub fn refresh_access_token<I, S>(
        &self,
        refresh_token: &str,
        stored: Option<&str>,
        authorities: I,
    ) -> Result<TokenPair, AuthError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let now = current_timestamp().map_err(AuthError::Token)?;
        self.refresh_access_token_at(refresh_token, stored, authorities, now)
    }

    pub fn refresh_access_token_at<I, S>(
        &self,
        refresh_token: &str,
        stored: Option<&str>,
        authorities: I,
        now: u64,
    ) -> Result<TokenPair, AuthError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let claims = self.decode_refresh(refresh_token)?;

        if is_expired(&claims, now) {
            return Err(AuthError::RefreshTokenExpired);
        }

        if stored != Some(refresh_token) {
            warn!(
                security_event = "refresh_token_mismatch",
                subject = %claims.sub,
                "Refresh token does not match the stored token"
            );
            return Err(AuthError::RefreshTokenMismatch);
        }

        let identity = Identity::new(claims.sub, authorities);
        self.issue_token_pair_at(&identity, now)
    }

    fn decode_refresh(&self, refresh_token: &str) -> Result<TokenClaims, AuthError> {
        let claims = self.codec.decode(refresh_token).map_err(|e| {
            if matches!(e, TokenError::InvalidSignature) {
                warn!(
                    security_event = "invalid_signature",
                    "Rejected refresh token with invalid signature"
                );
            }
            AuthError::Decode(e)
        })?;

        if claims.token_type != TokenType::Refresh {
            return Err(AuthError::Decode(TokenError::WrongTokenType));
        }
        Ok(claims)
    }
}
