//! Rate limiting for authentication endpoints.
//!
//! Uses a token bucket algorithm with per-IP tracking to slow down password
//! guessing and signup spam.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{Quota, RateLimiter, clock::DefaultClock, state::keyed::DefaultKeyedStateStore};
use std::{num::NonZeroU32, sync::Arc};
use tracing::warn;

use crate::auth::extract_client_ip;
use crate::cli::ClientIpHeader;

/// Per-IP rate limiter.
pub type IpLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

/// Default login attempts per minute per IP.
pub const DEFAULT_LOGIN_PER_MIN: u32 = 10;

/// Signup attempts per minute per IP.
const SIGNUP_PER_MIN: u32 = 3;

/// Rate limiting configuration for authentication endpoints.
pub struct RateLimitConfig {
    /// Per-IP limiter for login
    pub login: IpLimiter,
    /// Per-IP limiter for account creation
    pub signup: IpLimiter,
    /// Header carrying the client IP when running behind a proxy
    pub ip_header: Option<ClientIpHeader>,
}

impl RateLimitConfig {
    /// Create rate limiters. Signup is allowed at most as often as login.
    pub fn new(login_per_min: u32, ip_header: Option<ClientIpHeader>) -> Self {
        let login_per_min = NonZeroU32::new(login_per_min).unwrap_or(NonZeroU32::MIN);
        let signup_per_min = NonZeroU32::new(SIGNUP_PER_MIN.min(login_per_min.get()))
            .unwrap_or(NonZeroU32::MIN);

        Self {
            login: RateLimiter::keyed(Quota::per_minute(login_per_min)),
            signup: RateLimiter::keyed(Quota::per_minute(signup_per_min)),
            ip_header,
        }
    }
}

fn check(
    limiter: &IpLimiter,
    ip_header: Option<ClientIpHeader>,
    request: &Request,
    message: &'static str,
) -> Result<(), Response> {
    let ip = extract_client_ip(request, ip_header).map_err(|reason| {
        warn!(reason, "Unable to determine client IP");
        (StatusCode::FORBIDDEN, "Unable to determine client IP.").into_response()
    })?;

    limiter.check_key(&ip).map_err(|_| {
        warn!(ip = %ip, "Rate limit exceeded");
        (StatusCode::TOO_MANY_REQUESTS, message).into_response()
    })
}

/// Middleware for rate limiting login.
pub async fn rate_limit_login(
    State(config): State<Arc<RateLimitConfig>>,
    request: Request,
    next: Next,
) -> Response {
    match check(
        &config.login,
        config.ip_header,
        &request,
        "Too many login attempts. Please wait before trying again.",
    ) {
        Ok(()) => next.run(request).await,
        Err(response) => response,
    }
}

/// Middleware for rate limiting account creation.
pub async fn rate_limit_signup(
    State(config): State<Arc<RateLimitConfig>>,
    request: Request,
    next: Next,
) -> Response {
    match check(
        &config.signup,
        config.ip_header,
        &request,
        "Too many signup attempts. Please wait before trying again.",
    ) {
        Ok(()) => next.run(request).await,
        Err(response) => response,
    }
}
