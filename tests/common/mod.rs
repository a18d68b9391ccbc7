#![allow(dead_code)]

use std::net::SocketAddr;

use axum::{
    Extension, Router,
    body::Body,
    extract::ConnectInfo,
    http::{Request, StatusCode},
};
use healthme::{
    ServerConfig, auth::TokenSettings, cli::ClientIpHeader, create_app, db::Database,
    jwt::TokenCodec,
};
use jsonwebtoken::Algorithm;
use serde_json::{Value, json};
use tower::ServiceExt;

pub const JWT_SECRET: &[u8] = b"test-jwt-secret-that-is-long-enough";

/// Builder for test apps backed by an in-memory database.
pub struct TestSetup {
    login_rate_limit: u32,
    ip_header: Option<ClientIpHeader>,
    client_addr: SocketAddr,
}

impl TestSetup {
    pub fn new() -> Self {
        Self {
            login_rate_limit: 1000,
            ip_header: None,
            client_addr: SocketAddr::from(([127, 0, 0, 1], 40000)),
        }
    }

    pub fn with_login_rate_limit(mut self, per_min: u32) -> Self {
        self.login_rate_limit = per_min;
        self
    }

    pub fn with_ip_header(mut self, header: ClientIpHeader) -> Self {
        self.ip_header = Some(header);
        self
    }

    pub async fn build(self) -> (Router, Database) {
        let db = Database::open(":memory:")
            .await
            .expect("Failed to open test database");
        let config = ServerConfig {
            db: db.clone(),
            jwt_secret: JWT_SECRET.to_vec(),
            jwt_algorithm: Algorithm::HS256,
            token_settings: TokenSettings::default(),
            login_rate_limit: self.login_rate_limit,
            ip_header: self.ip_header,
        };
        // Stands in for the socket address the real server provides.
        let app = create_app(&config).layer(Extension(ConnectInfo(self.client_addr)));
        (app, db)
    }
}

pub async fn create_test_app() -> (Router, Database) {
    TestSetup::new().build().await
}

/// Codec sharing the test app's secret, for crafting tokens directly.
pub fn codec() -> TokenCodec {
    TokenCodec::new(JWT_SECRET, Algorithm::HS256)
}

/// Send a request and return the status with the JSON body (`Null` if the
/// body is not JSON).
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

pub fn post_json(uri: &str, body: Value, bearer: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = bearer {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn get(uri: &str, bearer: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = bearer {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

pub async fn sign_up(app: &Router, email: &str, password: &str) {
    let (status, body) = send(
        app,
        post_json(
            "/api/user/signup",
            json!({ "email": email, "password": password, "name": "Test" }),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "signup failed: {}", body);
}

/// Log in and return (access_token, refresh_token).
pub async fn login(app: &Router, email: &str, password: &str) -> (String, String) {
    let (status, body) = send(
        app,
        post_json(
            "/api/user/login",
            json!({ "email": email, "password": password }),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {}", body);
    (
        body["accessToken"].as_str().unwrap().to_string(),
        body["refreshToken"].as_str().unwrap().to_string(),
    )
}
