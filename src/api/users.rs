//! Account API endpoints.
//!
//! - POST `/signup` - Create an account
//! - POST `/login` - Exchange credentials for a token pair
//! - POST `/logout` - Revoke the caller's refresh token

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::post,
};
use serde::Serialize;
use std::sync::Arc;

use crate::auth::{AuthError, AuthService, Authenticated, Credentials, SignUpRequest};
use crate::rate_limit::{RateLimitConfig, rate_limit_login, rate_limit_signup};

#[derive(Clone)]
pub struct UsersState {
    pub service: AuthService,
    pub rate_limit_config: Arc<RateLimitConfig>,
}

pub fn router(state: UsersState) -> Router {
    let signup_router = Router::new()
        .route("/signup", post(sign_up))
        .with_state(state.service.clone())
        .layer(middleware::from_fn_with_state(
            state.rate_limit_config.clone(),
            rate_limit_signup,
        ));

    let login_router = Router::new()
        .route("/login", post(login))
        .with_state(state.service.clone())
        .layer(middleware::from_fn_with_state(
            state.rate_limit_config,
            rate_limit_login,
        ));

    let logout_router = Router::new()
        .route("/logout", post(logout))
        .with_state(state.service);

    Router::new()
        .merge(signup_router)
        .merge(login_router)
        .merge(logout_router)
}

#[derive(Serialize)]
struct LogoutResponse {
    success: bool,
}

async fn sign_up(
    State(service): State<AuthService>,
    payload: Result<Json<SignUpRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AuthError> {
    let Json(payload) = payload?;
    let account = service.sign_up(payload).await?;
    Ok((StatusCode::CREATED, Json(account)))
}

async fn login(
    State(service): State<AuthService>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Result<impl IntoResponse, AuthError> {
    let Json(payload) = payload?;
    let pair = service.sign_in(payload).await?;
    Ok(Json(pair))
}

async fn logout(
    State(service): State<AuthService>,
    Authenticated(identity): Authenticated,
) -> Result<impl IntoResponse, AuthError> {
    service.logout(&identity).await?;
    Ok(Json(LogoutResponse { success: true }))
}
