//! The identity-provider seam.
//!
//! Everything the subsystem needs from the OIDC provider is expressed as
//! [`IdentityProvider`]: authorization-URL construction, code exchange,
//! ID-token verification, introspection, refresh, and revocation. The
//! production adapter lives in the server crate; tests substitute fakes.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::ProviderError;

/// Tokens returned by a successful authorization-code exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSet {
    /// Opaque bearer access token.
    pub access_token: String,
    /// Refresh token, when the provider issues one.
    pub refresh_token: Option<String>,
    /// The raw signed ID token from the response's extension fields.
    pub id_token: Option<String>,
    /// Remaining access-token lifetime, when the provider reports one.
    pub expires_in: Option<Duration>,
}

/// Claims extracted from a cryptographically verified ID token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdTokenClaims {
    /// The `sub` claim.
    pub subject: String,
    /// The `email` claim, when present.
    pub email: Option<String>,
    /// The `groups` claim, when present.
    pub groups: Vec<String>,
}

/// Result of a token-introspection call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Introspection {
    /// Whether the provider considers the token currently valid.
    pub active: bool,
    /// The token's subject, when reported.
    pub subject: Option<String>,
}

/// Tokens returned by a refresh-token grant.
///
/// Fields other than `access_token` are optional: a provider that omits
/// them intends the previous values to remain in effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshedTokens {
    /// The replacement access token.
    pub access_token: String,
    /// A rotated refresh token, when issued.
    pub refresh_token: Option<String>,
    /// A re-issued ID token, when issued.
    pub id_token: Option<String>,
    /// Lifetime of the new access token.
    pub expires_in: Option<Duration>,
}

/// Narrow capability set over the OIDC identity provider.
///
/// All methods that perform network calls are bounded by the adapter's
/// HTTP-client timeout and abort when the caller's task is cancelled.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Builds the authorization-endpoint URL embedding `state`.
    fn authorization_url(&self, state: &str) -> String;

    /// Exchanges an authorization code for tokens at the token endpoint.
    async fn exchange(&self, code: &str) -> Result<TokenSet, ProviderError>;

    /// Verifies a raw ID token's signature, issuer, audience, and expiry
    /// against the provider's published keys and returns its claims.
    async fn verify(&self, raw_id_token: &str) -> Result<IdTokenClaims, ProviderError>;

    /// Asks the provider whether `access_token` is currently active.
    async fn introspect(&self, access_token: &str) -> Result<Introspection, ProviderError>;

    /// Exchanges `refresh_token` for a new token set.
    async fn refresh(&self, refresh_token: &str) -> Result<RefreshedTokens, ProviderError>;

    /// Best-effort revocation of `token` at the provider.
    async fn revoke(&self, token: &str) -> Result<(), ProviderError>;

    /// Builds the provider's end-session URL with the given post-logout
    /// redirect target.
    fn logout_url(&self, post_logout_redirect: &str) -> String;
}
