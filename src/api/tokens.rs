//! Token API endpoints.
//!
//! - POST `/refresh` - Exchange a refresh token for a new token pair

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    response::IntoResponse,
    routing::post,
};
use serde::Deserialize;

use crate::auth::{AuthError, AuthService};

pub fn router(service: AuthService) -> Router {
    Router::new()
        .route("/refresh", post(refresh_token))
        .with_state(service)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest {
    refresh_token: String,
}

/// The presented token must be the one currently stored for the account.
/// Both tokens are replaced on success.
async fn refresh_token(
    State(service): State<AuthService>,
    payload: Result<Json<RefreshRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AuthError> {
    let Json(payload) = payload?;
    let pair = service.refresh(&payload.refresh_token).await?;
    Ok(Json(pair))
}
