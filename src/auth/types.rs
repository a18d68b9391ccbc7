//! Authentication identity types.

use serde::Serialize;
use std::collections::BTreeSet;

use crate::jwt::TokenClaims;

/// Authority granted to every account.
pub const USER_AUTHORITY: &str = "user";

/// Authority granted to administrators.
pub const ADMIN_AUTHORITY: &str = "admin";

/// The authenticated subject and what it is allowed to do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    /// Account email
    pub subject: String,
    pub authorities: BTreeSet<String>,
}

impl Identity {
    pub fn new<I, S>(subject: impl Into<String>, authorities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            subject: subject.into(),
            authorities: authorities.into_iter().map(Into::into).collect(),
        }
    }

    pub fn has_authority(&self, authority: &str) -> bool {
        self.authorities.contains(authority)
    }

    pub(crate) fn from_claims(claims: TokenClaims) -> Self {
        Self {
            subject: claims.sub,
            authorities: claims.authorities.into_iter().collect(),
        }
    }
}

/// Request-scoped security context, stored in the request extensions by the
/// auth filter. `identity` is `None` when no valid access token was presented.
#[derive(Debug, Clone, Default)]
pub struct SecurityContext {
    pub identity: Option<Identity>,
}

impl SecurityContext {
    pub fn anonymous() -> Self {
        Self { identity: None }
    }

    pub fn authenticated(identity: Identity) -> Self {
        Self {
            identity: Some(identity),
        }
    }
}
