//! In-memory fakes shared by the handler and middleware tests.

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use axum::http::header;
use axum::response::Response;

use datamonster_auth::{
    AuthConfig, IdTokenClaims, IdentityProvider, Introspection, MemoryStore, ProviderError,
    RefreshedTokens, SessionRecord, SessionStore, StoreError, TokenSet, generate_token,
};

use super::AppState;

/// Scripted identity provider.
///
/// Exchanges succeed for any code except `bad-code`, introspection
/// reports the `active` flag, and refreshes either rotate to fixed
/// values or fail when `fail_refresh` is set.
pub(crate) struct FakeProvider {
    pub active: AtomicBool,
    pub fail_refresh: AtomicBool,
    pub fail_verify: AtomicBool,
    pub omit_id_token: AtomicBool,
    pub exchange_calls: AtomicUsize,
    pub introspect_calls: AtomicUsize,
    pub refresh_calls: AtomicUsize,
    pub revoke_calls: AtomicUsize,
    pub revoked: Mutex<Vec<String>>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self {
            active: AtomicBool::new(true),
            fail_refresh: AtomicBool::new(false),
            fail_verify: AtomicBool::new(false),
            omit_id_token: AtomicBool::new(false),
            exchange_calls: AtomicUsize::new(0),
            introspect_calls: AtomicUsize::new(0),
            refresh_calls: AtomicUsize::new(0),
            revoke_calls: AtomicUsize::new(0),
            revoked: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl IdentityProvider for FakeProvider {
    fn authorization_url(&self, state: &str) -> String {
        format!("https://idp.test/authorize?state={state}")
    }

    async fn exchange(&self, code: &str) -> Result<TokenSet, ProviderError> {
        self.exchange_calls.fetch_add(1, Ordering::SeqCst);
        if code == "bad-code" {
            return Err(ProviderError::TokenExchange {
                reason: "invalid_grant".to_string(),
            });
        }
        let id_token = if self.omit_id_token.load(Ordering::SeqCst) {
            None
        } else {
            Some(format!("idtoken-{code}"))
        };
        Ok(TokenSet {
            access_token: format!("access-{code}"),
            refresh_token: Some("refresh-1".to_string()),
            id_token,
            expires_in: Some(Duration::from_secs(600)),
        })
    }

    async fn verify(&self, _raw_id_token: &str) -> Result<IdTokenClaims, ProviderError> {
        if self.fail_verify.load(Ordering::SeqCst) {
            return Err(ProviderError::TokenValidation {
                reason: "signature mismatch".to_string(),
            });
        }
        Ok(IdTokenClaims {
            subject: "user-123".to_string(),
            email: Some("dm@example.com".to_string()),
            groups: vec!["settlement-keepers".to_string()],
        })
    }

    async fn introspect(&self, _access_token: &str) -> Result<Introspection, ProviderError> {
        self.introspect_calls.fetch_add(1, Ordering::SeqCst);
        Ok(Introspection {
            active: self.active.load(Ordering::SeqCst),
            subject: Some("user-123".to_string()),
        })
    }

    async fn refresh(&self, _refresh_token: &str) -> Result<RefreshedTokens, ProviderError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_refresh.load(Ordering::SeqCst) {
            return Err(ProviderError::Refresh {
                reason: "invalid_grant".to_string(),
            });
        }
        Ok(RefreshedTokens {
            access_token: "refreshed-access".to_string(),
            refresh_token: Some("refresh-2".to_string()),
            id_token: None,
            expires_in: Some(Duration::from_secs(600)),
        })
    }

    async fn revoke(&self, token: &str) -> Result<(), ProviderError> {
        self.revoke_calls.fetch_add(1, Ordering::SeqCst);
        self.revoked.lock().expect("lock").push(token.to_string());
        Ok(())
    }

    fn logout_url(&self, post_logout_redirect: &str) -> String {
        let mut url = "https://idp.test/api/oidc/revocation?post_logout_redirect_uri=".to_string();
        url.extend(url::form_urlencoded::byte_serialize(
            post_logout_redirect.as_bytes(),
        ));
        url
    }
}

/// Session store that counts calls and remembers the last TTL written.
pub(crate) struct CountingStore {
    pub inner: MemoryStore,
    pub get_calls: AtomicUsize,
    pub set_calls: AtomicUsize,
    pub delete_calls: AtomicUsize,
    pub exists_calls: AtomicUsize,
    pub last_ttl: Mutex<Option<Duration>>,
}

impl CountingStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            get_calls: AtomicUsize::new(0),
            set_calls: AtomicUsize::new(0),
            delete_calls: AtomicUsize::new(0),
            exists_calls: AtomicUsize::new(0),
            last_ttl: Mutex::new(None),
        }
    }
}

#[async_trait]
impl SessionStore for CountingStore {
    async fn get(&self, session_id: &str) -> Result<Option<Vec<u8>>, StoreError> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.get(session_id).await
    }

    async fn set(&self, session_id: &str, data: Vec<u8>, ttl: Duration) -> Result<(), StoreError> {
        self.set_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_ttl.lock().expect("lock") = Some(ttl);
        self.inner.set(session_id, data, ttl).await
    }

    async fn delete(&self, session_id: &str) -> Result<(), StoreError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.delete(session_id).await
    }

    async fn exists(&self, session_id: &str) -> Result<bool, StoreError> {
        self.exists_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.exists(session_id).await
    }
}

/// Session store whose every operation fails.
pub(crate) struct FailingStore;

#[async_trait]
impl SessionStore for FailingStore {
    async fn get(&self, _session_id: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Err(StoreError::Backend {
            details: "store down".to_string(),
        })
    }

    async fn set(
        &self,
        _session_id: &str,
        _data: Vec<u8>,
        _ttl: Duration,
    ) -> Result<(), StoreError> {
        Err(StoreError::Backend {
            details: "store down".to_string(),
        })
    }

    async fn delete(&self, _session_id: &str) -> Result<(), StoreError> {
        Err(StoreError::Backend {
            details: "store down".to_string(),
        })
    }

    async fn exists(&self, _session_id: &str) -> Result<bool, StoreError> {
        Err(StoreError::Backend {
            details: "store down".to_string(),
        })
    }
}

fn test_config() -> AuthConfig {
    AuthConfig {
        client_id: "datamonster".to_string(),
        client_secret: "shhh".to_string(),
        issuer_url: "https://idp.test".to_string(),
        redirect_url: "https://app.test/callback".to_string(),
        introspect_url: "https://idp.test/api/oidc/introspect".to_string(),
        token_url: "https://idp.test/api/oidc/token".to_string(),
        client_url: "https://app.test".to_string(),
        scopes: "openid,profile,email,groups".to_string(),
        secure_cookies: true,
        state_ttl_secs: 300,
        default_session_ttl_secs: 3600,
    }
}

/// Builds an [`AppState`] over fresh fakes, handing back the fakes too.
pub(crate) fn test_state() -> (Arc<AppState>, Arc<FakeProvider>, Arc<CountingStore>) {
    let provider = Arc::new(FakeProvider::new());
    let store = Arc::new(CountingStore::new());
    let state = Arc::new(AppState::new(
        Arc::clone(&provider) as Arc<dyn IdentityProvider>,
        Arc::clone(&store) as Arc<dyn SessionStore>,
        test_config(),
    ));
    (state, provider, store)
}

/// Builds an [`AppState`] whose store fails every call.
pub(crate) fn test_state_with_failing_store() -> (Arc<AppState>, Arc<FakeProvider>) {
    let provider = Arc::new(FakeProvider::new());
    let state = Arc::new(AppState::new(
        Arc::clone(&provider) as Arc<dyn IdentityProvider>,
        Arc::new(FailingStore),
        test_config(),
    ));
    (state, provider)
}

/// Writes a session record straight into the backing store, bypassing
/// the call counters, and returns its id.
pub(crate) async fn seed_session(store: &CountingStore, record: &SessionRecord) -> String {
    let session_id = generate_token().expect("token");
    let data = record.encode().expect("encode");
    store
        .inner
        .set(&session_id, data, Duration::from_secs(3600))
        .await
        .expect("seed");
    session_id
}

/// Collects every `Set-Cookie` header on a response.
pub(crate) fn set_cookies(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(str::to_string)
        .collect()
}

/// Extracts the value of a named cookie from collected `Set-Cookie` headers.
pub(crate) fn cookie_value(cookies: &[String], name: &str) -> Option<String> {
    let prefix = format!("{name}=");
    cookies.iter().find_map(|cookie| {
        let rest = cookie.strip_prefix(&prefix)?;
        Some(rest.split(';').next().unwrap_or("").to_string())
    })
}
