pub mod api;
pub mod auth;
pub mod cli;
pub mod db;
pub mod jwt;
pub mod rate_limit;

use api::create_api_router;
use auth::{AuthService, TokenProvider, TokenSettings, auth_filter};
use axum::{Router, middleware};
use db::Database;
use jsonwebtoken::Algorithm;
use jwt::TokenCodec;
use rate_limit::RateLimitConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

pub struct ServerConfig {
    /// Database connection (cloneable, uses connection pool internally)
    pub db: Database,
    /// Secret for signing tokens
    pub jwt_secret: Vec<u8>,
    /// Signing algorithm shared by access and refresh tokens
    pub jwt_algorithm: Algorithm,
    /// Token lifetimes
    pub token_settings: TokenSettings,
    /// Login attempts allowed per minute per client IP
    pub login_rate_limit: u32,
    /// IP extraction strategy (requires running behind a proxy)
    pub ip_header: Option<cli::ClientIpHeader>,
}

/// Create the application router with the given configuration.
pub fn create_app(config: &ServerConfig) -> Router {
    let codec = TokenCodec::new(&config.jwt_secret, config.jwt_algorithm);
    let provider = Arc::new(TokenProvider::new(codec, config.token_settings));
    let service = AuthService::new(config.db.clone(), provider.clone());

    let rate_limit_config = Arc::new(RateLimitConfig::new(
        config.login_rate_limit,
        config.ip_header,
    ));

    // The filter sits outside the nest so it sees full request paths.
    Router::new()
        .nest("/api", create_api_router(service, rate_limit_config))
        .layer(middleware::from_fn_with_state(provider, auth_filter))
}

/// Run the server on the given listener. This function blocks until the server exits.
pub async fn run_server(config: ServerConfig, listener: TcpListener) -> Result<(), std::io::Error> {
    let app = create_app(&config);
    let make_service = app.into_make_service_with_connect_info::<SocketAddr>();
    axum::serve(listener, make_service).await
}
