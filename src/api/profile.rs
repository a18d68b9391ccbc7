use axum::{Json, Router, response::IntoResponse, routing::get};

use crate::auth::Authenticated;

pub fn router() -> Router {
    Router::new().route("/profile", get(profile))
}

/// Identity attached to the current request.
async fn profile(Authenticated(identity): Authenticated) -> impl IntoResponse {
    Json(identity)
}
