//! Bearer-token authentication with role-based authorities.
//!
//! Dual-token system: short-lived access tokens (5 min, stateless) presented
//! in the Authorization header, and long-lived refresh tokens (2 weeks) of
//! which exactly one per account is stored and rotated on every use.

mod errors;
mod extractors;
mod filter;
mod ip;
mod password;
mod provider;
mod service;
mod types;

pub use errors::{ApiAuthError, AuthError};
pub use extractors::{AdminOnly, Authenticated};
pub use filter::{
    BEARER_PREFIX, PUBLIC_PATH_PREFIXES, auth_filter, filter_request, is_public_path,
    resolve_bearer_token,
};
pub use ip::extract_client_ip;
pub use password::{hash_password, verify_password};
pub use provider::{
    ACCESS_TOKEN_DURATION_SECS, REFRESH_TOKEN_DURATION_SECS, TokenPair, TokenProvider,
    TokenSettings,
};
pub use service::{AccountSummary, AuthService, Credentials, SignUpRequest};
pub use types::{ADMIN_AUTHORITY, Identity, SecurityContext, USER_AUTHORITY};
