//! Strongly-typed identifier for authenticated users.
//!
//! User ids come from the identity provider's `sub` claim, which is an
//! opaque string. The newtype keeps the propagated identity type-checked
//! through the handler chain instead of passing bare strings around.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The authenticated user's identifier, taken from the verified ID token's
/// `sub` claim.
///
/// A `UserId` is never minted locally; it only ever exists after an ID
/// token has been cryptographically verified.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Creates a user id from a verified subject claim.
    #[must_use]
    pub fn new(subject: String) -> Self {
        Self(subject)
    }

    /// Returns the user id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}
