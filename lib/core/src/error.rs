//! Workspace-wide `Result` alias.
//!
//! Fallible constructors and other non-trait entry points return
//! `Result<T, DomainError>` from this alias, which wraps the domain error
//! in a rootcause `Report` so callers get the full cause chain. Trait
//! seams (`SessionStore`, `IdentityProvider`) keep their concrete error
//! enums, since callers there branch on the variant rather than report it.

use rootcause::Report;

/// Result whose error side is a rootcause `Report` over a domain error.
pub type Result<T, C = ()> = std::result::Result<T, Report<C>>;
