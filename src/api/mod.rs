mod admin;
mod profile;
mod tokens;
mod users;

use axum::Router;
use std::sync::Arc;

use crate::auth::AuthService;
use crate::rate_limit::RateLimitConfig;

/// Create the API router.
pub fn create_api_router(service: AuthService, rate_limit_config: Arc<RateLimitConfig>) -> Router {
    let users_state = users::UsersState {
        service: service.clone(),
        rate_limit_config,
    };

    Router::new()
        .nest("/user", users::router(users_state))
        .nest("/admin", admin::router(service.clone()))
        .merge(tokens::router(service))
        .merge(profile::router())
}
