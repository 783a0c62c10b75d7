//! Caller identity
//!
//! Every request carries (or lacks) an authenticated subject identifier.
//! The subject is opaque to IdeaMesh; it is only compared for equality and
//! stored alongside answers, unlocks and incentive balances.

pub mod jwt;

pub use jwt::{extract_token_from_header, Claims, JwtValidator, TokenValidationResult};

use tracing::debug;

use crate::types::{IdeaMeshError, Result};

/// Header accepted as the subject in dev mode when no token is sent
pub const DEV_USER_HEADER: &str = "x-dev-user";

/// The caller of an operation: authenticated subject or anonymous
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity(Option<String>);

impl Identity {
    pub fn user(subject: impl Into<String>) -> Self {
        Self(Some(subject.into()))
    }

    pub fn anonymous() -> Self {
        Self(None)
    }

    pub fn subject(&self) -> Option<&str> {
        self.0.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.0.is_some()
    }

    /// The subject, or an `Unauthorized` error for anonymous callers
    pub fn require(&self) -> Result<&str> {
        self.subject().ok_or_else(IdeaMeshError::unauthenticated)
    }
}

/// Resolve the caller from request headers.
///
/// A valid bearer token wins. Without one, dev mode accepts the
/// `X-Dev-User` header. Invalid tokens resolve to anonymous.
pub fn resolve_identity(
    jwt: &JwtValidator,
    auth_header: Option<&str>,
    dev_user: Option<&str>,
    dev_mode: bool,
) -> Identity {
    if let Some(token) = extract_token_from_header(auth_header) {
        let result = jwt.verify_token(token);
        if let Some(claims) = result.claims {
            return Identity::user(claims.sub);
        }
        debug!(error = ?result.error, "Ignoring invalid bearer token");
    }

    if dev_mode {
        if let Some(user) = dev_user.map(str::trim).filter(|u| !u.is_empty()) {
            return Identity::user(user);
        }
    }

    Identity::anonymous()
}
