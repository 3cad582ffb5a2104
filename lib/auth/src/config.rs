//! Auth configuration.
//!
//! All values arrive from the environment; policy defaults (cookie TTLs,
//! session-lifetime fallback, requested scopes) are named here rather than
//! inlined at the call sites so tests can override them.

use serde::Deserialize;

use crate::error::ConfigError;

/// Configuration for the OIDC relying party and session policy.
///
/// Fields with defaults can be omitted when loading from environment
/// variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// The OAuth2 client ID registered with the provider.
    pub client_id: String,
    /// The OAuth2 client secret.
    pub client_secret: String,
    /// The OIDC issuer URL, used for discovery.
    pub issuer_url: String,
    /// The redirect URI for the authorization-code callback.
    pub redirect_url: String,
    /// The provider's token-introspection endpoint.
    pub introspect_url: String,
    /// The provider's token endpoint, used for refresh grants.
    pub token_url: String,
    /// The client application URL users are sent back to after login.
    pub client_url: String,
    /// Scopes to request as a comma-separated string.
    /// Default: "openid,profile,email,groups"
    #[serde(default = "default_scopes")]
    pub scopes: String,
    /// Whether cookies carry the Secure flag (requires HTTPS).
    /// Default: true; set to false only for local HTTP development.
    #[serde(default = "default_secure_cookies")]
    pub secure_cookies: bool,
    /// Lifetime of the single-use state cookie, in seconds.
    #[serde(default = "default_state_ttl_secs")]
    pub state_ttl_secs: u64,
    /// Session TTL used when the provider omits a token expiry, in
    /// seconds.
    #[serde(default = "default_session_ttl_secs")]
    pub default_session_ttl_secs: u64,
}

fn default_scopes() -> String {
    "openid,profile,email,groups".to_string()
}

fn default_secure_cookies() -> bool {
    true
}

fn default_state_ttl_secs() -> u64 {
    300
}

fn default_session_ttl_secs() -> u64 {
    3600
}

impl AuthConfig {
    /// Checks that every required endpoint and credential is present.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] naming the first missing field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required: [(&'static str, &str); 7] = [
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
            ("issuer_url", &self.issuer_url),
            ("redirect_url", &self.redirect_url),
            ("introspect_url", &self.introspect_url),
            ("token_url", &self.token_url),
            ("client_url", &self.client_url),
        ];

        for (field, value) in required {
            if value.is_empty() {
                return Err(ConfigError::MissingField { field });
            }
        }

        Ok(())
    }

    /// Returns the scopes to request, parsed from the comma-separated
    /// string.
    #[must_use]
    pub fn scopes(&self) -> Vec<&str> {
        self.scopes.split(',').map(str::trim).collect()
    }

    /// Returns the provider's revocation endpoint, derived from the
    /// issuer.
    #[must_use]
    pub fn revocation_url(&self) -> String {
        format!(
            "{}/api/oidc/revocation",
            self.issuer_url.trim_end_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AuthConfig {
        AuthConfig {
            client_id: "client-id".to_string(),
            client_secret: "client-secret".to_string(),
            issuer_url: "https://idp.example.com".to_string(),
            redirect_url: "https://api.example.com/callback".to_string(),
            introspect_url: "https://idp.example.com/api/oidc/introspection".to_string(),
            token_url: "https://idp.example.com/api/oidc/token".to_string(),
            client_url: "https://app.example.com".to_string(),
            scopes: default_scopes(),
            secure_cookies: true,
            state_ttl_secs: default_state_ttl_secs(),
            default_session_ttl_secs: default_session_ttl_secs(),
        }
    }

    #[test]
    fn complete_config_validates() {
        assert!(config().validate().is_ok());
    }

    #[test]
    fn missing_field_is_named() {
        let mut broken = config();
        broken.introspect_url = String::new();

        let err = broken.validate().expect_err("should fail");
        assert_eq!(
            err,
            ConfigError::MissingField {
                field: "introspect_url"
            }
        );
    }

    #[test]
    fn defaults_deserialize() {
        let json = r#"{
            "client_id": "c",
            "client_secret": "s",
            "issuer_url": "https://idp.example.com",
            "redirect_url": "https://api.example.com/callback",
            "introspect_url": "https://idp.example.com/introspect",
            "token_url": "https://idp.example.com/token",
            "client_url": "https://app.example.com"
        }"#;

        let config: AuthConfig = serde_json::from_str(json).expect("deserialize");
        assert!(config.secure_cookies);
        assert_eq!(config.state_ttl_secs, 300);
        assert_eq!(config.default_session_ttl_secs, 3600);
        assert_eq!(config.scopes(), vec!["openid", "profile", "email", "groups"]);
    }

    #[test]
    fn revocation_url_derives_from_issuer() {
        let mut config = config();
        config.issuer_url = "https://idp.example.com/".to_string();
        assert_eq!(
            config.revocation_url(),
            "https://idp.example.com/api/oidc/revocation"
        );
    }
}
