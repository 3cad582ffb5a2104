//! Authentication module for the datamonster server.
//!
//! This module drives the OIDC authorization-code flow end to end:
//! - `oidc`: production [`IdentityProvider`] adapter (discovery, code
//!   exchange, ID-token verification, introspection, refresh, revocation)
//! - `routes`: the login/callback/logout/check HTTP handlers
//! - `middleware`: the per-request authorizer guarding protected routes
//! - `cookie`: the `oauth_state` and `dm_session` cookie builders
//!
//! # Authorization model
//!
//! A session record in the store is never itself proof of validity: the
//! authorizer re-checks the stored access token against the provider's
//! introspection endpoint on every protected request, so server-side
//! revocation at the IdP takes effect immediately at the cost of one
//! upstream round-trip per request.

pub mod cookie;
pub mod middleware;
pub mod oidc;
pub mod routes;

#[cfg(test)]
pub(crate) mod testing;

use datamonster_auth::{AuthConfig, IdentityProvider, SessionStore};
use std::sync::Arc;

pub use middleware::{CurrentUser, authorize};
pub use oidc::OidcProvider;
pub use routes::{callback, check, login, logout};

/// Shared application state.
///
/// Both collaborators are long-lived and safe for concurrent use; all
/// per-session mutation is delegated to the store's per-key atomicity.
pub struct AppState {
    /// Identity-provider client.
    pub provider: Arc<dyn IdentityProvider>,
    /// Session store.
    pub sessions: Arc<dyn SessionStore>,
    /// Auth and cookie policy configuration.
    pub config: AuthConfig,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        sessions: Arc<dyn SessionStore>,
        config: AuthConfig,
    ) -> Self {
        Self {
            provider,
            sessions,
            config,
        }
    }
}
