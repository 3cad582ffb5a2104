//! Server-side session records.
//!
//! A session record is created only after a callback has verified an ID
//! token. It is stored under an opaque, cryptographically random session
//! identifier that doubles as the session cookie value, and is rewritten
//! whenever the access token is refreshed.

use base64::Engine;
use datamonster_core::UserId;
use rand::RngCore;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};

use crate::provider::RefreshedTokens;

/// Number of random bytes in a session identifier or state token.
const TOKEN_BYTES: usize = 32;

/// Opaque identifier for a stored session.
///
/// Session ids are the base64url encoding of 32 random bytes and are
/// distinct from any token issued by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Wraps an existing session id, e.g. one read back from a cookie.
    #[must_use]
    pub fn new(id: String) -> Self {
        Self(id)
    }

    /// Returns the session id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Generates a fresh random token for use as a session id or OAuth state
/// value.
///
/// # Errors
///
/// Returns an error only if the operating system's random generator fails;
/// callers treat that as fatal to the request, not the process.
pub fn generate_token() -> Result<String, rand::Error> {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.try_fill_bytes(&mut bytes)?;
    Ok(base64::engine::general_purpose::URL_SAFE.encode(bytes))
}

/// The durable state of an authenticated browser session.
///
/// Exists in the store only after a callback successfully verified an ID
/// token. Refreshes may replace the tokens but never `user_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Opaque bearer credential issued by the identity provider.
    pub access_token: String,
    /// Refresh credential; absent when the provider does not issue one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// The raw, signed ID token from the last exchange or refresh.
    pub id_token: String,
    /// The `sub` claim of the verified ID token.
    pub user_id: UserId,
}

impl SessionRecord {
    /// Builds a record from a completed code exchange.
    #[must_use]
    pub fn new(
        access_token: String,
        refresh_token: Option<String>,
        id_token: String,
        user_id: UserId,
    ) -> Self {
        Self {
            access_token,
            refresh_token,
            id_token,
            user_id,
        }
    }

    /// Serializes the record to the store's byte-oriented value format.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn encode(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }

    /// Deserializes a record from a stored value.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed payloads; callers treat those
    /// sessions as invalid.
    pub fn decode(data: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(data)
    }

    /// Applies a refresh response, replacing only the fields the provider
    /// actually returned. `user_id` is immutable for the session lifetime.
    pub fn apply_refresh(&mut self, refreshed: &RefreshedTokens) {
        self.access_token = refreshed.access_token.clone();
        if let Some(refresh_token) = &refreshed.refresh_token {
            self.refresh_token = Some(refresh_token.clone());
        }
        if let Some(id_token) = &refreshed.id_token {
            self.id_token = id_token.clone();
        }
    }
}
