//! Axum extractors for authentication.
//!
//! These read the [`SecurityContext`] left by the auth filter and are where
//! unauthenticated or under-privileged requests get rejected.

use axum::{extract::FromRequestParts, http::request::Parts};

use super::errors::ApiAuthError;
use super::types::{ADMIN_AUTHORITY, Identity, SecurityContext};

fn identity_from_parts(parts: &Parts) -> Option<Identity> {
    parts
        .extensions
        .get::<SecurityContext>()
        .and_then(|context| context.identity.clone())
}

/// Extractor for endpoints that require an authenticated identity.
pub struct Authenticated(pub Identity);

impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = ApiAuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        identity_from_parts(parts)
            .map(Authenticated)
            .ok_or(ApiAuthError::NotAuthenticated)
    }
}

/// Extractor for endpoints restricted to administrators.
pub struct AdminOnly(pub Identity);

impl<S> FromRequestParts<S> for AdminOnly
where
    S: Send + Sync,
{
    type Rejection = ApiAuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let identity = identity_from_parts(parts).ok_or(ApiAuthError::NotAuthenticated)?;
        if !identity.has_authority(ADMIN_AUTHORITY) {
            return Err(ApiAuthError::InsufficientRole);
        }
        Ok(AdminOnly(identity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with(context: Option<SecurityContext>) -> Parts {
        let mut request = Request::builder().uri("/api/profile").body(()).unwrap();
        if let Some(context) = context {
            request.extensions_mut().insert(context);
        }
        request.into_parts().0
    }

    #[tokio::test]
    async fn test_authenticated_requires_identity() {
        let mut parts = parts_with(Some(SecurityContext::anonymous()));
        let result = Authenticated::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(ApiAuthError::NotAuthenticated)));

        let mut parts = parts_with(None);
        let result = Authenticated::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(ApiAuthError::NotAuthenticated)));
    }

    #[tokio::test]
    async fn test_authenticated_with_identity() {
        let identity = Identity::new("a@x.com", ["user"]);
        let mut parts = parts_with(Some(SecurityContext::authenticated(identity.clone())));

        let Authenticated(found) = Authenticated::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(found, identity);
    }

    #[tokio::test]
    async fn test_admin_only() {
        let mut parts = parts_with(None);
        let result = AdminOnly::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(ApiAuthError::NotAuthenticated)));

        let user = Identity::new("a@x.com", ["user"]);
        let mut parts = parts_with(Some(SecurityContext::authenticated(user)));
        let result = AdminOnly::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(ApiAuthError::InsufficientRole)));

        let admin = Identity::new("root@x.com", ["admin", "user"]);
        let mut parts = parts_with(Some(SecurityContext::authenticated(admin)));
        assert!(AdminOnly::from_request_parts(&mut parts, &()).await.is_ok());
    }
}
