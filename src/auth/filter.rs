//! Request authentication filter.
//!
//! Runs once per request ahead of the API handlers. Public paths are passed
//! through untouched. Every other request gets a [`SecurityContext`] in its
//! extensions, carrying the identity when a valid bearer token was presented.
//! The filter never rejects a request for a missing or bad token; handlers
//! enforce authentication through the extractors.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{self, HeaderMap, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::trace;

use super::errors::AuthError;
use super::provider::TokenProvider;
use super::types::SecurityContext;

/// Path prefixes that bypass authentication entirely.
pub const PUBLIC_PATH_PREFIXES: &[&str] = &["/api/user/login", "/api/user/signup", "/api/refresh"];

/// Required scheme prefix of the Authorization header (case-sensitive).
pub const BEARER_PREFIX: &str = "Bearer ";

/// Whether `path` starts with one of the public prefixes.
pub fn is_public_path(path: &str) -> bool {
    PUBLIC_PATH_PREFIXES
        .iter()
        .any(|prefix| path.starts_with(prefix))
}

/// Extract the bearer token from the Authorization header, if any.
pub fn resolve_bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix(BEARER_PREFIX)?;
    (!token.is_empty()).then_some(token)
}

/// Attach the security context for `request`.
///
/// Fails only when a token that passed validation cannot be turned into an
/// identity; that error is propagated rather than downgraded to anonymous.
pub fn filter_request<B>(
    provider: &TokenProvider,
    request: &mut http::Request<B>,
) -> Result<(), AuthError> {
    if is_public_path(request.uri().path()) {
        trace!(path = %request.uri().path(), "Public path, skipping authentication");
        return Ok(());
    }

    let context = match resolve_bearer_token(request.headers()) {
        Some(token) if provider.validate_access_token(token) => {
            SecurityContext::authenticated(provider.get_authentication(token)?)
        }
        Some(_) => SecurityContext::anonymous(),
        None => {
            trace!(path = %request.uri().path(), "No bearer token");
            SecurityContext::anonymous()
        }
    };

    request.extensions_mut().insert(context);
    Ok(())
}

/// Axum middleware wrapping [`filter_request`].
pub async fn auth_filter(
    State(provider): State<Arc<TokenProvider>>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Err(e) = filter_request(&provider, &mut request) {
        return e.into_response();
    }
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::provider::TokenSettings;
    use crate::auth::types::Identity;
    use crate::jwt::{TokenClaims, TokenCodec, current_timestamp};
    use axum::http::HeaderValue;
    use jsonwebtoken::Algorithm;

    fn provider() -> TokenProvider {
        TokenProvider::new(
            TokenCodec::new(b"test-secret-key-for-testing", Algorithm::HS256),
            TokenSettings::default(),
        )
    }

    fn request(path: &str, authorization: Option<&str>) -> http::Request<()> {
        let mut builder = http::Request::builder().uri(path);
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(()).unwrap()
    }

    fn context(request: &http::Request<()>) -> Option<&SecurityContext> {
        request.extensions().get::<SecurityContext>()
    }

    #[test]
    fn test_public_paths() {
        assert!(is_public_path("/api/user/login"));
        assert!(is_public_path("/api/user/signup"));
        assert!(is_public_path("/api/refresh"));
        assert!(is_public_path("/api/user/login/extra"));
        assert!(!is_public_path("/api/profile"));
        assert!(!is_public_path("/api/user/logout"));
        assert!(!is_public_path("/api/user"));
        assert!(!is_public_path("/x/api/user/login"));
    }

    #[test]
    fn test_resolve_bearer_token() {
        let mut headers = HeaderMap::new();
        assert_eq!(resolve_bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(resolve_bearer_token(&headers), Some("abc.def.ghi"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("bearer abc"));
        assert_eq!(resolve_bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(resolve_bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(resolve_bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearerabc"));
        assert_eq!(resolve_bearer_token(&headers), None);
    }

    #[test]
    fn test_public_path_passes_through_unchanged() {
        let provider = provider();
        let mut req = request("/api/user/login", None);

        filter_request(&provider, &mut req).unwrap();
        assert!(context(&req).is_none());
    }

    #[test]
    fn test_public_path_ignores_token() {
        let provider = provider();
        let pair = provider
            .issue_token_pair(&Identity::new("a@x.com", ["user"]))
            .unwrap();
        let mut req = request(
            "/api/refresh",
            Some(&format!("Bearer {}", pair.access_token)),
        );

        filter_request(&provider, &mut req).unwrap();
        assert!(context(&req).is_none());
    }

    #[test]
    fn test_valid_token_attaches_identity() {
        let provider = provider();
        let identity = Identity::new("a@x.com", ["user"]);
        let pair = provider.issue_token_pair(&identity).unwrap();
        let mut req = request(
            "/api/profile",
            Some(&format!("Bearer {}", pair.access_token)),
        );

        filter_request(&provider, &mut req).unwrap();
        assert_eq!(context(&req).unwrap().identity, Some(identity));
    }

    #[test]
    fn test_missing_token_continues_anonymous() {
        let provider = provider();
        let mut req = request("/api/profile", None);

        filter_request(&provider, &mut req).unwrap();
        assert_eq!(context(&req).unwrap().identity, None);
    }

    #[test]
    fn test_expired_token_continues_anonymous() {
        let provider = provider();
        let now = current_timestamp().unwrap();
        let claims = TokenClaims::access("a@x.com", vec!["user".into()], now - 600, 300);
        let token = provider.codec().encode(&claims).unwrap();
        let mut req = request("/api/profile", Some(&format!("Bearer {}", token)));

        filter_request(&provider, &mut req).unwrap();
        assert_eq!(context(&req).unwrap().identity, None);
    }

    #[test]
    fn test_forged_token_continues_anonymous() {
        let provider = provider();
        let forger = TokenProvider::new(
            TokenCodec::new(b"attacker-secret", Algorithm::HS256),
            TokenSettings::default(),
        );
        let pair = forger
            .issue_token_pair(&Identity::new("a@x.com", ["admin"]))
            .unwrap();
        let mut req = request(
            "/api/profile",
            Some(&format!("Bearer {}", pair.access_token)),
        );

        filter_request(&provider, &mut req).unwrap();
        assert_eq!(context(&req).unwrap().identity, None);
    }
}
