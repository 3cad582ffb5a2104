//! Login, callback, logout, and session-check handlers.
//!
//! The callback enforces the state-cookie contract before anything else:
//! the `state` query parameter must match the `oauth_state` cookie byte
//! for byte, and the cookie is cleared on every callback outcome.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::Cookie;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use datamonster_auth::{SessionId, SessionRecord, generate_token};
use datamonster_core::UserId;

use super::AppState;
use super::cookie::{
    SESSION_COOKIE, STATE_COOKIE, clear_session_cookie, clear_state_cookie, session_cookie,
    state_cookie,
};

/// Failures surfaced by the login and callback handlers.
#[derive(Debug)]
pub enum AuthError {
    MissingStateCookie,
    StateMismatch,
    MissingCode,
    TokenGeneration { reason: String },
    Exchange { reason: String },
    MissingIdToken,
    Verification { reason: String },
    SerializeSession { reason: String },
    StoreWrite { reason: String },
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingStateCookie => write!(f, "state cookie is missing"),
            Self::StateMismatch => write!(f, "state parameter does not match state cookie"),
            Self::MissingCode => write!(f, "authorization code is missing"),
            Self::TokenGeneration { reason } => {
                write!(f, "failed to generate random token: {reason}")
            }
            Self::Exchange { reason } => write!(f, "authorization code exchange failed: {reason}"),
            Self::MissingIdToken => write!(f, "token response did not include an ID token"),
            Self::Verification { reason } => write!(f, "ID token verification failed: {reason}"),
            Self::SerializeSession { reason } => {
                write!(f, "failed to serialize session record: {reason}")
            }
            Self::StoreWrite { reason } => write!(f, "failed to persist session: {reason}"),
        }
    }
}

impl std::error::Error for AuthError {}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match &self {
            Self::MissingStateCookie | Self::StateMismatch | Self::MissingCode => {
                tracing::warn!(error = %self, "rejected OIDC callback");
                (StatusCode::BAD_REQUEST, "invalid authorization callback").into_response()
            }
            _ => {
                tracing::error!(error = %self, "login failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
            }
        }
    }
}

/// Starts the authorization-code flow.
///
/// Generates a fresh state token, pins it in a short-lived cookie, and
/// redirects the browser to the provider's authorization endpoint.
pub async fn login(State(app): State<Arc<AppState>>, jar: CookieJar) -> Response {
    let state = match generate_token() {
        Ok(state) => state,
        Err(err) => {
            return AuthError::TokenGeneration {
                reason: err.to_string(),
            }
            .into_response();
        }
    };

    let url = app.provider.authorization_url(&state);
    let cookie = state_cookie(state, app.config.state_ttl_secs, app.config.secure_cookies);
    (jar.add(cookie), Redirect::temporary(&url)).into_response()
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

/// Completes the authorization-code flow.
pub async fn callback(
    State(app): State<Arc<AppState>>,
    jar: CookieJar,
    Query(query): Query<CallbackQuery>,
) -> Response {
    let Some(expected_state) = jar.get(STATE_COOKIE).map(|c| c.value().to_string()) else {
        return AuthError::MissingStateCookie.into_response();
    };

    // The state cookie is single use whatever happens next.
    let jar = jar.add(clear_state_cookie(app.config.secure_cookies));

    if query.state.as_deref() != Some(expected_state.as_str()) {
        return (jar, AuthError::StateMismatch).into_response();
    }

    let code = match query.code.as_deref() {
        Some(code) if !code.is_empty() => code,
        _ => return (jar, AuthError::MissingCode).into_response(),
    };

    match complete_login(&app, code).await {
        Ok((cookie, redirect)) => (jar.add(cookie), redirect).into_response(),
        Err(err) => (jar, err).into_response(),
    }
}

/// Exchanges the code, verifies the ID token, and persists a new session.
async fn complete_login(
    app: &AppState,
    code: &str,
) -> Result<(Cookie<'static>, Redirect), AuthError> {
    let tokens = app
        .provider
        .exchange(code)
        .await
        .map_err(|err| AuthError::Exchange {
            reason: err.to_string(),
        })?;

    let raw_id_token = tokens.id_token.ok_or(AuthError::MissingIdToken)?;

    let claims =
        app.provider
            .verify(&raw_id_token)
            .await
            .map_err(|err| AuthError::Verification {
                reason: err.to_string(),
            })?;

    let session_id = generate_token()
        .map(SessionId::from)
        .map_err(|err| AuthError::TokenGeneration {
            reason: err.to_string(),
        })?;

    let record = SessionRecord {
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
        id_token: raw_id_token,
        user_id: UserId::from(claims.subject),
    };
    let data = record.encode().map_err(|err| AuthError::SerializeSession {
        reason: err.to_string(),
    })?;

    let ttl = tokens
        .expires_in
        .unwrap_or(Duration::from_secs(app.config.default_session_ttl_secs));
    app.sessions
        .set(session_id.as_str(), data, ttl)
        .await
        .map_err(|err| AuthError::StoreWrite {
            reason: err.to_string(),
        })?;

    let cookie = session_cookie(session_id.as_str(), ttl, app.config.secure_cookies);
    Ok((cookie, Redirect::temporary(&app.config.client_url)))
}

#[derive(Debug, Deserialize)]
pub struct LogoutQuery {
    #[serde(default)]
    redirect_uri: Option<String>,
}

/// Ends the session and hands the browser to the provider's logout page.
///
/// Store and revocation failures are logged and swallowed; the browser
/// always ends up logged out locally and redirected to the provider.
pub async fn logout(
    State(app): State<Arc<AppState>>,
    jar: CookieJar,
    Query(query): Query<LogoutQuery>,
) -> Response {
    if let Some(session_id) = jar.get(SESSION_COOKIE).map(|c| SessionId::from(c.value()))
        && !session_id.as_str().is_empty()
    {
        end_session(&app, &session_id).await;
    }

    let post_logout = query
        .redirect_uri
        .filter(|uri| !uri.is_empty())
        .unwrap_or_else(|| app.config.client_url.clone());
    let url = app.provider.logout_url(&post_logout);

    let jar = jar.add(clear_session_cookie(app.config.secure_cookies));
    (jar, Redirect::temporary(&url)).into_response()
}

/// Deletes the stored session and revokes its access token, best effort.
async fn end_session(app: &AppState, session_id: &SessionId) {
    let record = match app.sessions.get(session_id.as_str()).await {
        Ok(Some(data)) => SessionRecord::decode(&data).ok(),
        Ok(None) => None,
        Err(err) => {
            tracing::warn!(%err, "failed to load session during logout");
            None
        }
    };

    if let Err(err) = app.sessions.delete(session_id.as_str()).await {
        tracing::warn!(%err, "failed to delete session during logout");
    }

    if let Some(record) = record
        && !record.access_token.is_empty()
        && let Err(err) = app.provider.revoke(&record.access_token).await
    {
        tracing::warn!(%err, "failed to revoke access token during logout");
    }
}

/// Reports whether the caller currently holds a known session.
///
/// Existence only; token liveness is the authorizer's concern.
pub async fn check(State(app): State<Arc<AppState>>, jar: CookieJar) -> StatusCode {
    let Some(session_id) = jar.get(SESSION_COOKIE).map(|c| SessionId::from(c.value())) else {
        return StatusCode::UNAUTHORIZED;
    };
    if session_id.as_str().is_empty() {
        return StatusCode::UNAUTHORIZED;
    }

    match app.sessions.exists(session_id.as_str()).await {
        Ok(true) => StatusCode::OK,
        Ok(false) => StatusCode::UNAUTHORIZED,
        Err(err) => {
            tracing::warn!(%err, "session existence check failed");
            StatusCode::UNAUTHORIZED
        }
    }
}
