//! Request authorizer for the protected API surface.
//!
//! Every protected request re-validates the session: the stored access
//! token is introspected at the provider, and sessions holding a refresh
//! token are rotated in-request so the stored tokens never go stale.

use axum::extract::{FromRequestParts, Request, State};
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::CookieJar;
use std::sync::Arc;
use std::time::Duration;

use datamonster_auth::{SessionId, SessionRecord};
use datamonster_core::UserId;

use super::AppState;
use super::cookie::{SESSION_COOKIE, session_cookie};

/// The authenticated caller, inserted by [`authorize`].
#[derive(Clone, Debug)]
pub struct CurrentUser(pub UserId);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or(StatusCode::UNAUTHORIZED)
    }
}

fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, "Unauthorized").into_response()
}

fn server_error() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
}

/// Validates the session cookie and stamps the request with [`CurrentUser`].
pub async fn authorize(
    State(app): State<Arc<AppState>>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    let Some(session_id) = jar.get(SESSION_COOKIE).map(|c| SessionId::from(c.value())) else {
        return unauthorized();
    };
    if session_id.as_str().is_empty() {
        return unauthorized();
    }

    let data = match app.sessions.get(session_id.as_str()).await {
        Ok(Some(data)) => data,
        Ok(None) => return unauthorized(),
        Err(err) => {
            tracing::warn!(%err, "failed to load session");
            return unauthorized();
        }
    };

    let mut record = match SessionRecord::decode(&data) {
        Ok(record) => record,
        Err(err) => {
            tracing::warn!(%err, "failed to decode session record");
            return unauthorized();
        }
    };

    let active = match app.provider.introspect(&record.access_token).await {
        Ok(introspection) => introspection.active,
        Err(err) => {
            tracing::warn!(%err, "token introspection failed");
            false
        }
    };
    if !active {
        if let Err(err) = app.sessions.delete(session_id.as_str()).await {
            tracing::warn!(%err, "failed to delete revoked session");
        }
        return unauthorized();
    }

    // Rotate tokens only when the provider issued a refresh token;
    // otherwise the session simply rides out the access token's lifetime.
    let refreshed_ttl = match record.refresh_token.clone().filter(|t| !t.is_empty()) {
        Some(refresh_token) => {
            match refresh_session(&app, &session_id, &mut record, &refresh_token).await {
                Ok(ttl) => Some(ttl),
                Err(()) => return server_error(),
            }
        }
        None => None,
    };

    req.extensions_mut()
        .insert(CurrentUser(record.user_id.clone()));
    let response = next.run(req).await;

    match refreshed_ttl {
        Some(ttl) => {
            let cookie = session_cookie(session_id.as_str(), ttl, app.config.secure_cookies);
            (jar.add(cookie), response).into_response()
        }
        None => response,
    }
}

/// Runs the refresh grant and rewrites the stored record under the same key.
async fn refresh_session(
    app: &AppState,
    session_id: &SessionId,
    record: &mut SessionRecord,
    refresh_token: &str,
) -> Result<Duration, ()> {
    let refreshed = match app.provider.refresh(refresh_token).await {
        Ok(refreshed) => refreshed,
        Err(err) => {
            tracing::error!(%err, "token refresh failed");
            return Err(());
        }
    };

    record.apply_refresh(&refreshed);
    let data = match record.encode() {
        Ok(data) => data,
        Err(err) => {
            tracing::error!(%err, "failed to serialize refreshed session");
            return Err(());
        }
    };

    let ttl = refreshed
        .expires_in
        .unwrap_or(Duration::from_secs(app.config.default_session_ttl_secs));
    if let Err(err) = app.sessions.set(session_id.as_str(), data, ttl).await {
        tracing::error!(%err, "failed to persist refreshed session");
        return Err(());
    }

    Ok(ttl)
}
