//! Error types for the auth crate.
//!
//! - `ProviderError`: failures talking to the OIDC identity provider
//! - `StoreError`: failures talking to the session store
//! - `ConfigError`: invalid or incomplete auth configuration

use std::fmt;

/// Errors from identity-provider operations.
///
/// Every variant represents a failure to obtain proof of validity; callers
/// must treat them as "not authorized" or "cannot authorize", never as an
/// excuse to forward a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// Provider configuration is invalid (bad URLs, etc.).
    Configuration { reason: String },
    /// OIDC discovery against the issuer failed.
    Discovery { reason: String },
    /// Authorization-code exchange failed.
    TokenExchange { reason: String },
    /// ID token failed cryptographic verification.
    TokenValidation { reason: String },
    /// A required claim was absent from the verified ID token.
    MissingClaim { claim: String },
    /// Token introspection call failed.
    Introspection { reason: String },
    /// Refresh-token grant failed or returned no access token.
    Refresh { reason: String },
    /// Token revocation call failed.
    Revocation { reason: String },
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration { reason } => {
                write!(f, "provider configuration error: {reason}")
            }
            Self::Discovery { reason } => {
                write!(f, "OIDC discovery error: {reason}")
            }
            Self::TokenExchange { reason } => {
                write!(f, "token exchange error: {reason}")
            }
            Self::TokenValidation { reason } => {
                write!(f, "ID token validation error: {reason}")
            }
            Self::MissingClaim { claim } => {
                write!(f, "missing required claim: {claim}")
            }
            Self::Introspection { reason } => {
                write!(f, "token introspection error: {reason}")
            }
            Self::Refresh { reason } => {
                write!(f, "token refresh error: {reason}")
            }
            Self::Revocation { reason } => {
                write!(f, "token revocation error: {reason}")
            }
        }
    }
}

impl std::error::Error for ProviderError {}

/// Errors from session-store operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store backend failed or was unreachable.
    Backend { details: String },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Backend { details } => {
                write!(f, "session store error: {details}")
            }
        }
    }
}

impl std::error::Error for StoreError {}

/// Errors from auth configuration validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required configuration value was not provided.
    MissingField { field: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingField { field } => {
                write!(f, "missing required value: {field}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
