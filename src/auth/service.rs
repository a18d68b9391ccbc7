//! Account-level authentication flows: signup, login, logout and refresh.
//!
//! Login overwrites the account's stored refresh token, refresh rotates it and
//! logout clears it, so at most one refresh token per account is ever valid.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use super::errors::AuthError;
use super::password::{hash_password, verify_password};
use super::provider::{TokenPair, TokenProvider};
use super::types::Identity;
use crate::db::{Database, NewAccount, UserRole};

/// Login credentials. Absent fields read as empty and are rejected by
/// [`AuthService::sign_in`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Signup request. Email and password are required.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignUpRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    pub nickname: Option<String>,
}

/// Public view of a newly created account.
#[derive(Debug, Clone, Serialize)]
pub struct AccountSummary {
    pub email: String,
    pub name: Option<String>,
}

#[derive(Clone)]
pub struct AuthService {
    db: Database,
    provider: Arc<TokenProvider>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl AuthService {
    pub fn new(db: Database, provider: Arc<TokenProvider>) -> Self {
        Self { db, provider }
    }

    pub fn provider(&self) -> &TokenProvider {
        &self.provider
    }

    /// Register a new account with a bcrypt-hashed password.
    pub async fn sign_up(&self, request: SignUpRequest) -> Result<AccountSummary, AuthError> {
        let email = non_blank(request.email).ok_or(AuthError::MissingEmail)?;
        let password = request
            .password
            .filter(|p| !p.is_empty())
            .ok_or(AuthError::MissingPassword)?;

        if !self.db.accounts().is_email_available(&email).await? {
            return Err(AuthError::EmailTaken);
        }

        let password_hash = hash_password(password).await?;
        let name = non_blank(request.name);
        let nickname = non_blank(request.nickname);

        let created = self
            .db
            .accounts()
            .create(&NewAccount {
                email: &email,
                password_hash: &password_hash,
                name: name.as_deref(),
                nickname: nickname.as_deref(),
                role: UserRole::User,
            })
            .await;

        match created {
            Ok(_) => {}
            // Lost a race with a concurrent signup for the same email.
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                return Err(AuthError::EmailTaken);
            }
            Err(e) => return Err(e.into()),
        }

        info!(email = %email, "Account created");
        Ok(AccountSummary { email, name })
    }

    /// Check the credentials, issue a token pair and store its refresh token.
    pub async fn sign_in(&self, credentials: Credentials) -> Result<TokenPair, AuthError> {
        let email = credentials.email.trim();
        if email.is_empty() {
            return Err(AuthError::MissingEmail);
        }
        if credentials.password.is_empty() {
            return Err(AuthError::MissingPassword);
        }

        let Some(account) = self.db.accounts().find_by_email(email).await? else {
            info!(email = %email, "Login for unknown account");
            return Err(AuthError::InvalidCredentials);
        };

        if !verify_password(credentials.password, account.password_hash.clone()).await? {
            info!(email = %account.email, "Login with wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        let identity = Identity::new(account.email.clone(), account.role.authorities());
        let pair = self.provider.issue_token_pair(&identity)?;

        self.db
            .accounts()
            .save_refresh_token(&account.email, Some(pair.refresh_token.as_str()))
            .await?;

        info!(subject = %account.email, "Signed in");
        Ok(pair)
    }

    /// Revoke the caller's refresh token.
    pub async fn logout(&self, identity: &Identity) -> Result<(), AuthError> {
        self.revoke(&identity.subject).await?;
        info!(subject = %identity.subject, "Logged out");
        Ok(())
    }

    /// Clear the stored refresh token of any account. Access tokens already
    /// issued stay valid until they expire.
    pub async fn revoke(&self, email: &str) -> Result<(), AuthError> {
        if !self.db.accounts().save_refresh_token(email, None).await? {
            return Err(AuthError::AccountNotFound);
        }
        Ok(())
    }

    /// Exchange a refresh token for a new pair, rotating the stored token.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let subject = self.provider.refresh_subject(refresh_token)?;

        let account = self
            .db
            .accounts()
            .find_by_email(&subject)
            .await?
            .ok_or(AuthError::AccountNotFound)?;

        let pair = self.provider.refresh_access_token(
            refresh_token,
            account.refresh_token.as_deref(),
            account.role.authorities(),
        )?;

        // Lost a race with another refresh or a logout for this account.
        let rotated = self
            .db
            .accounts()
            .rotate_refresh_token(&account.email, refresh_token, &pair.refresh_token)
            .await?;
        if !rotated {
            warn!(
                security_event = "refresh_token_mismatch",
                subject = %account.email,
                "Refresh token was replaced concurrently"
            );
            return Err(AuthError::RefreshTokenMismatch);
        }

        info!(subject = %account.email, "Refreshed tokens");
        Ok(pair)
    }
}
