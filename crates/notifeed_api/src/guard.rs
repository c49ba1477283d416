//! Access guard contract: turns a request context into a trusted recipient.
//!
//! # Invariants
//! - Feed calls run only after `resolve_recipient` returned `Some`.
//! - Recipient identity comes from the authenticated session, never from
//!   request parameters.

use notifeed_core::Recipient;

/// Resolves the authenticated recipient for one request.
pub trait AccessGuard {
    /// Transport-specific request data the guard inspects.
    type Context;

    /// Returns `None` when the caller is not authenticated.
    fn resolve_recipient(&self, ctx: &Self::Context) -> Option<Recipient>;
}

/// Minimal request context carrying the session subject set by upstream auth.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    authenticated_user: Option<String>,
}

impl RequestContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Context for a session whose subject upstream middleware has verified.
    pub fn authenticated(user: impl Into<String>) -> Self {
        Self {
            authenticated_user: Some(user.into()),
        }
    }

    pub fn authenticated_user(&self) -> Option<&str> {
        self.authenticated_user.as_deref()
    }
}

/// Guard that trusts the session subject on `RequestContext`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionGuard;

impl AccessGuard for SessionGuard {
    type Context = RequestContext;

    fn resolve_recipient(&self, ctx: &RequestContext) -> Option<Recipient> {
        ctx.authenticated_user()
            .map(str::trim)
            .filter(|user| !user.is_empty())
            .map(Recipient::new)
    }
}
