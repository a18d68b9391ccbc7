//! Admin API endpoints.
//!
//! All endpoints require the admin authority.

use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    routing::post,
};
use tracing::info;

use crate::auth::{AdminOnly, AuthError, AuthService};

pub fn router(service: AuthService) -> Router {
    Router::new()
        .route("/accounts/{email}/revoke", post(revoke_account))
        .with_state(service)
}

/// Force a logout by clearing the account's refresh token.
async fn revoke_account(
    State(service): State<AuthService>,
    AdminOnly(admin): AdminOnly,
    Path(email): Path<String>,
) -> Result<StatusCode, AuthError> {
    match service.revoke(&email).await {
        Ok(()) => {
            info!(admin = %admin.subject, email = %email, "Revoked refresh token");
            Ok(StatusCode::NO_CONTENT)
        }
        Err(AuthError::AccountNotFound) => Ok(StatusCode::NOT_FOUND),
        Err(e) => Err(e),
    }
}
