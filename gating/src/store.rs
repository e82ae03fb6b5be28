//! # Key-Value Store
//!
//! External storage capability, two scopes:
//!
//! - [`Scope::Session`]: gone when the browsing session ends. Holds the
//!   one-shot suppression flags and the unread totals.
//! - [`Scope::Durable`]: survives restarts. Holds the cached tier flag.
//!
//! The `server` crate backs this with redis (session keys carry a TTL);
//! [`MemoryStore`] backs tests and the tester binary.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Session,
    Durable,
}

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, scope: Scope, key: &str) -> Result<Option<String>, StoreError>;

    async fn set(&self, scope: Scope, key: &str, value: &str) -> Result<(), StoreError>;

    async fn remove(&self, scope: Scope, key: &str) -> Result<(), StoreError>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    session: Mutex<HashMap<String, String>>,
    durable: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn map(&self, scope: Scope) -> &Mutex<HashMap<String, String>> {
        match scope {
            Scope::Session => &self.session,
            Scope::Durable => &self.durable,
        }
    }

    /// Drops everything session-scoped, keeps durable entries.
    pub fn end_session(&self) {
        self.session.lock().unwrap().clear();
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, scope: Scope, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.map(scope).lock().unwrap().get(key).cloned())
    }

    async fn set(&self, scope: Scope, key: &str, value: &str) -> Result<(), StoreError> {
        self.map(scope)
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());

        Ok(())
    }

    async fn remove(&self, scope: Scope, key: &str) -> Result<(), StoreError> {
        self.map(scope).lock().unwrap().remove(key);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scopes_are_separate() {
        let store = MemoryStore::new();

        store.set(Scope::Session, "k", "s").await.unwrap();
        store.set(Scope::Durable, "k", "d").await.unwrap();

        assert_eq!(
            store.get(Scope::Session, "k").await.unwrap(),
            Some("s".to_string())
        );
        assert_eq!(
            store.get(Scope::Durable, "k").await.unwrap(),
            Some("d".to_string())
        );
    }

    #[tokio::test]
    async fn test_end_session_keeps_durable() {
        let store = MemoryStore::new();

        store.set(Scope::Session, "flag", "1").await.unwrap();
        store.set(Scope::Durable, "vip_plus", "vip_plus").await.unwrap();

        store.end_session();

        assert_eq!(store.get(Scope::Session, "flag").await.unwrap(), None);
        assert_eq!(
            store.get(Scope::Durable, "vip_plus").await.unwrap(),
            Some("vip_plus".to_string())
        );
    }

    #[tokio::test]
    async fn test_remove() {
        let store = MemoryStore::new();

        store.set(Scope::Session, "k", "v").await.unwrap();
        store.remove(Scope::Session, "k").await.unwrap();

        assert_eq!(store.get(Scope::Session, "k").await.unwrap(), None);
    }
}
