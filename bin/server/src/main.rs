//! Datamonster API server entry point.

mod api;
mod auth;
mod config;
mod server;

use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use datamonster_auth::MemoryStore;

use crate::auth::{AppState, OidcProvider};
use crate::config::ServerConfig;

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env().expect("failed to load configuration");
    config.auth.validate().expect("invalid auth configuration");

    let provider = OidcProvider::discover(config.auth.clone())
        .await
        .expect("OIDC provider discovery failed");

    let state = Arc::new(AppState::new(
        Arc::new(provider),
        Arc::new(MemoryStore::new()),
        config.auth,
    ));

    server::serve(state, &config.listen_addr)
        .await
        .expect("server error");
}
