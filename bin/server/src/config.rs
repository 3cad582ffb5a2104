//! Server configuration, loaded from `DATAMONSTER__`-prefixed
//! environment variables.
//!
//! Nested fields use a double-underscore separator, so the provider
//! client id arrives as `DATAMONSTER__AUTH__CLIENT_ID`.

use config::{Config, ConfigError, Environment};
use serde::Deserialize;

use datamonster_auth::AuthConfig;

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    /// OIDC and session policy configuration.
    pub auth: AuthConfig,
}

fn default_listen_addr() -> String {
    "0.0.0.0:8080".to_string()
}

impl ServerConfig {
    /// Loads configuration from the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a required value is missing or cannot be
    /// deserialized.
    pub fn from_env() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(Environment::with_prefix("DATAMONSTER").separator("__"))
            .build()?
            .try_deserialize()
    }
}
