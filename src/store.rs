//! Per-user preference persistence.
//!
//! The host owns the actual storage; this module defines the narrow contract
//! the locale logic needs (get/set one string per user) and an in-memory
//! implementation for tests and database-less runs.

use futures::future::{BoxFuture, FutureExt};
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("preference store unavailable: {0}")]
    Unavailable(String),

    #[error("preference store did not answer within {0:?}")]
    Timeout(Duration),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Key-value store holding one locale preference per authenticated user.
///
/// `user_id` is the opaque host identity; the preference name is fixed by the
/// implementation.
pub trait PreferenceStore: Send + Sync {
    fn get<'a>(&'a self, user_id: &'a str) -> BoxFuture<'a, Result<Option<String>, StoreError>>;

    fn set<'a>(&'a self, user_id: &'a str, value: &'a str) -> BoxFuture<'a, Result<(), StoreError>>;
}

/// Run a store call, turning an overrun into `StoreError::Timeout`.
pub async fn with_timeout<T, Fut>(timeout: Duration, call: Fut) -> Result<T, StoreError>
where
    Fut: Future<Output = Result<T, StoreError>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout(timeout)),
    }
}

/// In-memory store.
///
/// Can be switched into a failing mode to exercise degraded paths.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
    failing: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with `StoreError::Unavailable`.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of successful `set` calls so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Stored value for `user_id`, bypassing the failure switch.
    pub fn stored(&self, user_id: &str) -> Option<String> {
        self.values
            .lock()
            .ok()
            .and_then(|values| values.get(user_id).cloned())
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store switched off".to_string()));
        }
        Ok(())
    }
}

impl PreferenceStore for MemoryStore {
    fn get<'a>(&'a self, user_id: &'a str) -> BoxFuture<'a, Result<Option<String>, StoreError>> {
        async move {
            self.check_available()?;
            let values = self
                .values
                .lock()
                .map_err(|_| StoreError::Unavailable("memory store poisoned".to_string()))?;
            Ok::<_, StoreError>(values.get(user_id).cloned())
        }
        .boxed()
    }

    fn set<'a>(&'a self, user_id: &'a str, value: &'a str) -> BoxFuture<'a, Result<(), StoreError>> {
        async move {
            self.check_available()?;
            let mut values = self
                .values
                .lock()
                .map_err(|_| StoreError::Unavailable("memory store poisoned".to_string()))?;
            values.insert(user_id.to_string(), value.to_string());
            self.writes.fetch_add(1, Ordering::SeqCst);
            Ok::<_, StoreError>(())
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Store whose calls never complete.
    struct StalledStore;

    impl PreferenceStore for StalledStore {
        fn get<'a>(&'a self, _user_id: &'a str) -> BoxFuture<'a, Result<Option<String>, StoreError>> {
            futures::future::pending().boxed()
        }

        fn set<'a>(&'a self, _user_id: &'a str, _value: &'a str) -> BoxFuture<'a, Result<(), StoreError>> {
            futures::future::pending().boxed()
        }
    }

    // ==================== MemoryStore Tests ====================

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let store = MemoryStore::new();
        assert_eq!(store.get("u1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let store = MemoryStore::new();
        store.set("u1", "fr_FR").await.unwrap();
        assert_eq!(store.get("u1").await.unwrap(), Some("fr_FR".to_string()));
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn test_set_overwrites() {
        let store = MemoryStore::new();
        store.set("u1", "fr_FR").await.unwrap();
        store.set("u1", "de_DE").await.unwrap();
        assert_eq!(store.stored("u1"), Some("de_DE".to_string()));
        assert_eq!(store.write_count(), 2);
    }

    #[tokio::test]
    async fn test_users_are_isolated() {
        let store = MemoryStore::new();
        store.set("u1", "fr_FR").await.unwrap();
        assert_eq!(store.get("u2").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_failing_store_errors() {
        let store = MemoryStore::new();
        store.set_failing(true);

        assert!(matches!(store.get("u1").await, Err(StoreError::Unavailable(_))));
        assert!(matches!(store.set("u1", "fr_FR").await, Err(StoreError::Unavailable(_))));
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_failing_store_recovers() {
        let store = MemoryStore::new();
        store.set_failing(true);
        store.set_failing(false);
        store.set("u1", "fr_FR").await.unwrap();
        assert_eq!(store.stored("u1"), Some("fr_FR".to_string()));
    }

    // ==================== Timeout Tests ====================

    #[tokio::test]
    async fn test_with_timeout_passes_result_through() {
        let store = MemoryStore::new();
        store.set("u1", "it_IT").await.unwrap();

        let result = with_timeout(Duration::from_secs(1), store.get("u1")).await;
        assert_eq!(result.unwrap(), Some("it_IT".to_string()));
    }

    #[tokio::test]
    async fn test_with_timeout_on_stalled_store() {
        let store = StalledStore;
        let result = with_timeout(Duration::from_millis(20), store.get("u1")).await;

        match result {
            Err(StoreError::Timeout(d)) => assert_eq!(d, Duration::from_millis(20)),
            other => panic!("Expected timeout, got {:?}", other),
        }
    }

    #[test]
    fn test_error_display() {
        let err = StoreError::Unavailable("down".to_string());
        assert_eq!(err.to_string(), "preference store unavailable: down");
    }
}
