//! Cookie names and builders for the auth flow.
//!
//! Two cookies exist: the single-use `oauth_state` cookie covering the
//! redirect round-trip to the identity provider, and the `dm_session`
//! cookie carrying the opaque session id. Both are HttpOnly and
//! SameSite=Lax; the Secure flag follows configuration so local HTTP
//! development stays possible.

use axum_extra::extract::cookie::{Cookie, SameSite};
use std::time::Duration;
use time::Duration as TimeDuration;

/// Name of the single-use OAuth state cookie.
pub const STATE_COOKIE: &str = "oauth_state";

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "dm_session";

/// Builds the state cookie set by the login handler.
pub fn state_cookie(value: String, ttl_secs: u64, secure: bool) -> Cookie<'static> {
    Cookie::build((STATE_COOKIE, value))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(TimeDuration::seconds(ttl_secs as i64))
        .build()
}

/// Builds the session cookie with `MaxAge` matching the store TTL.
pub fn session_cookie(session_id: &str, ttl: Duration, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, session_id.to_string()))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(TimeDuration::seconds(ttl.as_secs() as i64))
        .build()
}

/// Builds the removal cookie that clears the state cookie.
pub fn clear_state_cookie(secure: bool) -> Cookie<'static> {
    Cookie::build((STATE_COOKIE, ""))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(TimeDuration::ZERO)
        .build()
}

/// Builds the removal cookie that clears the session cookie.
pub fn clear_session_cookie(secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(TimeDuration::ZERO)
        .build()
}
