//! The session store seam.
//!
//! The store is an external key-value collaborator with per-key TTL. The
//! subsystem only ever touches it through [`SessionStore`], which keeps the
//! wire backend (Redis-compatible server, SQL table, in-memory map)
//! swappable and lets tests inject fakes without a DI framework.

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::error::StoreError;

/// Byte-oriented key-value store with per-key TTL semantics.
///
/// An expired entry is indistinguishable from one that never existed.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Fetches the value stored under `session_id`, or `None` if the key
    /// is absent or expired.
    async fn get(&self, session_id: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Stores `data` under `session_id`, replacing any previous value and
    /// resetting the TTL.
    async fn set(&self, session_id: &str, data: Vec<u8>, ttl: Duration) -> Result<(), StoreError>;

    /// Removes the entry under `session_id`. Deleting an absent key is not
    /// an error.
    async fn delete(&self, session_id: &str) -> Result<(), StoreError>;

    /// Reports whether a live (non-expired) entry exists under
    /// `session_id`.
    async fn exists(&self, session_id: &str) -> Result<bool, StoreError>;
}

struct Entry {
    data: Vec<u8>,
    expires_at: Instant,
}

impl Entry {
    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// In-process [`SessionStore`] adapter.
///
/// Suitable for single-process deployments and tests. Expired entries are
/// treated as absent on read and reaped lazily on write.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Entry>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn get(&self, session_id: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(session_id)
            .filter(|entry| !entry.is_expired())
            .map(|entry| entry.data.clone()))
    }

    async fn set(&self, session_id: &str, data: Vec<u8>, ttl: Duration) -> Result<(), StoreError> {
        let mut entries = self.entries.write().await;
        entries.retain(|_, entry| !entry.is_expired());
        entries.insert(
            session_id.to_string(),
            Entry {
                data,
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn delete(&self, session_id: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.write().await;
        entries.remove(session_id);
        Ok(())
    }

    async fn exists(&self, session_id: &str) -> Result<bool, StoreError> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(session_id)
            .is_some_and(|entry| !entry.is_expired()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(60);

    #[tokio::test]
    async fn get_returns_stored_value() {
        let store = MemoryStore::new();
        store.set("s1", b"payload".to_vec(), TTL).await.expect("set");

        let value = store.get("s1").await.expect("get");
        assert_eq!(value.as_deref(), Some(b"payload".as_slice()));
    }

    #[tokio::test]
    async fn get_missing_key_is_none() {
        let store = MemoryStore::new();
        assert_eq!(store.get("nope").await.expect("get"), None);
    }

    #[tokio::test]
    async fn set_replaces_value_and_ttl() {
        let store = MemoryStore::new();
        store.set("s1", b"old".to_vec(), TTL).await.expect("set");
        store.set("s1", b"new".to_vec(), TTL).await.expect("set");

        let value = store.get("s1").await.expect("get");
        assert_eq!(value.as_deref(), Some(b"new".as_slice()));
    }

    #[tokio::test]
    async fn delete_removes_entry() {
        let store = MemoryStore::new();
        store.set("s1", b"payload".to_vec(), TTL).await.expect("set");
        store.delete("s1").await.expect("delete");

        assert!(!store.exists("s1").await.expect("exists"));
    }

    #[tokio::test]
    async fn delete_of_absent_key_is_ok() {
        let store = MemoryStore::new();
        store.delete("never-there").await.expect("delete");
    }

    #[tokio::test(start_paused = true)]
    async fn expired_entry_behaves_as_absent() {
        let store = MemoryStore::new();
        store
            .set("s1", b"payload".to_vec(), Duration::from_secs(5))
            .await
            .expect("set");

        tokio::time::advance(Duration::from_secs(6)).await;

        assert_eq!(store.get("s1").await.expect("get"), None);
        assert!(!store.exists("s1").await.expect("exists"));
    }

    #[tokio::test(start_paused = true)]
    async fn rewrite_extends_expiry() {
        let store = MemoryStore::new();
        store
            .set("s1", b"v1".to_vec(), Duration::from_secs(5))
            .await
            .expect("set");

        tokio::time::advance(Duration::from_secs(3)).await;
        store
            .set("s1", b"v2".to_vec(), Duration::from_secs(5))
            .await
            .expect("set");

        tokio::time::advance(Duration::from_secs(3)).await;
        assert!(store.exists("s1").await.expect("exists"));
    }
}
