//! Authentication error types.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::jwt::TokenError;

#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
}

/// Failures of the authentication core.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// A presented token could not be trusted
    #[error("failed to decode token: {0}")]
    Decode(#[source] TokenError),
    /// The refresh token is not the one on record for the account
    #[error("refresh token does not match the stored token")]
    RefreshTokenMismatch,
    #[error("refresh token has expired")]
    RefreshTokenExpired,
    #[error("account not found")]
    AccountNotFound,
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("email is required")]
    MissingEmail,
    #[error("password is required")]
    MissingPassword,
    #[error("password is too long")]
    PasswordTooLong,
    #[error("email is already registered")]
    EmailTaken,
    /// Request body missing, not JSON, or the wrong shape
    #[error("invalid request body: {0}")]
    InvalidBody(#[from] JsonRejection),
    /// Failed to issue a token
    #[error("failed to issue token: {0}")]
    Token(#[source] TokenError),
    #[error("password hashing failed: {0}")]
    PasswordHash(String),
    #[error("account store error: {0}")]
    Store(#[from] sqlx::Error),
}

impl AuthError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Decode(_)
            | Self::RefreshTokenMismatch
            | Self::RefreshTokenExpired
            | Self::AccountNotFound
            | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::MissingEmail | Self::MissingPassword | Self::PasswordTooLong => {
                StatusCode::BAD_REQUEST
            }
            Self::EmailTaken => StatusCode::CONFLICT,
            Self::InvalidBody(rejection) => rejection.status(),
            Self::Token(_) | Self::PasswordHash(_) | Self::Store(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn message(&self) -> &'static str {
        match self {
            Self::Decode(_) => "Invalid token",
            Self::RefreshTokenMismatch => "Refresh token has been revoked",
            Self::RefreshTokenExpired => "Refresh token has expired",
            Self::AccountNotFound => "Account not found",
            Self::InvalidCredentials => "Invalid email or password",
            Self::MissingEmail => "Email is required",
            Self::MissingPassword => "Password is required",
            Self::PasswordTooLong => "Password must be at most 72 bytes",
            Self::EmailTaken => "Email is already registered",
            Self::InvalidBody(_) => "Invalid request body",
            Self::Token(_) => "Failed to generate token",
            Self::PasswordHash(_) | Self::Store(_) => "Internal error",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "Authentication failure");
        }
        (
            status,
            Json(ErrorResponse {
                error: self.message(),
            }),
        )
            .into_response()
    }
}

/// Rejections produced by the authentication extractors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiAuthError {
    NotAuthenticated,
    InsufficientRole,
}

impl ApiAuthError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::NotAuthenticated => StatusCode::UNAUTHORIZED,
            Self::InsufficientRole => StatusCode::FORBIDDEN,
        }
    }

    fn message(&self) -> &'static str {
        match self {
            Self::NotAuthenticated => "Not authenticated",
            Self::InsufficientRole => "Insufficient permissions",
        }
    }
}

impl IntoResponse for ApiAuthError {
    fn into_response(self) -> Response {
        (
            self.status_code(),
            Json(ErrorResponse {
                error: self.message(),
            }),
        )
            .into_response()
    }
}
