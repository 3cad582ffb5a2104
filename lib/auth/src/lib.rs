//! Session and token authorization for the datamonster backend.
//!
//! This crate holds the protocol state of the OIDC authorization-code
//! flow and everything downstream of it:
//! - The durable session record and its byte codec (`SessionRecord`)
//! - Random session/state token generation
//! - The session store seam (`SessionStore`) with an in-memory adapter
//! - The identity-provider seam (`IdentityProvider`)
//! - Auth configuration and validation (`AuthConfig`)
//!
//! The HTTP handlers and middleware that drive these types live in the
//! server crate; this crate stays framework-free so the seams can be faked
//! in tests.
//!
//! # Example
//!
//! ```
//! use datamonster_auth::{SessionRecord, generate_token};
//! use datamonster_core::UserId;
//!
//! let session_id = generate_token().expect("random generator");
//! let record = SessionRecord::new(
//!     "access-token".to_string(),
//!     Some("refresh-token".to_string()),
//!     "raw.id.token".to_string(),
//!     UserId::from("auth0|123456"),
//! );
//!
//! let bytes = record.encode().expect("serialize");
//! assert_eq!(SessionRecord::decode(&bytes).expect("decode"), record);
//! assert_eq!(session_id.len(), 44);
//! ```

pub mod config;
pub mod error;
pub mod provider;
pub mod session;
pub mod store;

// Re-export main types at crate root
pub use config::AuthConfig;
pub use error::{ConfigError, ProviderError, StoreError};
pub use provider::{
    IdTokenClaims, IdentityProvider, Introspection, RefreshedTokens, TokenSet,
};
pub use session::{SessionId, SessionRecord, generate_token};
pub use store::{MemoryStore, SessionStore};
