//! Router assembly and the serve loop.

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use std::sync::Arc;
use std::time::Duration;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::api;
use crate::auth::{self, AppState};

/// Upper bound on request handling, covering the in-request provider
/// round-trips.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Builds the full application router.
///
/// Everything under `/api` passes through the session authorizer; the
/// auth flow and the probes are public.
pub fn router(state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .route("/me", get(api::me))
        .route_layer(axum::middleware::from_fn_with_state(
            Arc::clone(&state),
            auth::authorize,
        ));

    Router::new()
        .route("/heartbeat", get(heartbeat))
        .route("/ready", get(ready))
        .route("/login", get(auth::login))
        .route("/callback", get(auth::callback))
        .route("/logout", get(auth::logout))
        .route("/check", get(auth::check))
        .nest("/api", protected)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .with_state(state)
}

/// Binds the listener and serves until interrupted.
///
/// # Errors
///
/// Returns an error if binding or serving fails.
pub async fn serve(state: Arc<AppState>, listen_addr: &str) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(listen_addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(%err, "failed to install shutdown signal handler");
    }
}

/// Liveness probe.
async fn heartbeat() -> &'static str {
    "ok"
}

/// Readiness probe; reports unavailable when the session store is down.
async fn ready(State(app): State<Arc<AppState>>) -> StatusCode {
    match app.sessions.exists("readiness-probe").await {
        Ok(_) => StatusCode::OK,
        Err(err) => {
            tracing::warn!(%err, "session store unavailable");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
