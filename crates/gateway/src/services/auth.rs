//! API token authentication.
//!
//! Tokens are checked against the storefront's `api` table, with a single
//! statically configured key as fallback. Successful lookups are cached for
//! a fixed TTL; a revoked key stays valid until its entry expires.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use secrecy::{ExposeSecret, SecretString};
use sqlx::MySqlPool;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::db::{ApiKeyRepository, RepositoryError, Statements};

/// Identity returned for the static key.
pub const INTERNAL_USER: &str = "internal";

/// Authentication failures.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("token not provided")]
    NotProvided,

    #[error("invalid token")]
    InvalidToken,

    #[error("token lookup failed: {0}")]
    Lookup(#[from] RepositoryError),
}

/// Source of API credentials.
pub trait ApiKeyStore: Send + Sync {
    /// Username owning `token`, if any.
    fn lookup(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<Option<String>, RepositoryError>> + Send;
}

/// Credentials from the storefront `api` table.
#[derive(Clone)]
pub struct DbKeyStore {
    pool: MySqlPool,
    statements: Arc<Statements>,
}

impl DbKeyStore {
    #[must_use]
    pub const fn new(pool: MySqlPool, statements: Arc<Statements>) -> Self {
        Self { pool, statements }
    }
}

impl ApiKeyStore for DbKeyStore {
    async fn lookup(&self, token: &str) -> Result<Option<String>, RepositoryError> {
        ApiKeyRepository::new(&self.pool, &self.statements)
            .find_username(token)
            .await
    }
}

/// Compare two byte strings without short-circuiting on the first mismatch.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Token cache in front of an [`ApiKeyStore`].
#[derive(Clone)]
pub struct AuthCache<S> {
    store: S,
    static_key: Option<SecretString>,
    cache: Cache<String, String>,
}

impl<S: ApiKeyStore> AuthCache<S> {
    /// Create a cache whose entries live for `ttl`.
    #[must_use]
    pub fn new(store: S, static_key: Option<SecretString>, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(ttl)
            .build();

        Self {
            store,
            static_key,
            cache,
        }
    }

    /// Username for `token`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotProvided` for an empty token,
    /// `AuthError::InvalidToken` if neither the store nor the static key
    /// accepts it, or `AuthError::Lookup` if the store fails.
    #[instrument(skip_all)]
    pub async fn authenticate(&self, token: &str) -> Result<String, AuthError> {
        if token.is_empty() {
            return Err(AuthError::NotProvided);
        }

        if let Some(username) = self.cache.get(token).await {
            return Ok(username);
        }

        if let Some(username) = self.store.lookup(token).await? {
            debug!(username = %username, "API token accepted");
            self.cache.insert(token.to_string(), username.clone()).await;
            return Ok(username);
        }

        if let Some(key) = &self.static_key
            && constant_time_eq(key.expose_secret().as_bytes(), token.as_bytes())
        {
            debug!("Static API key accepted");
            self.cache
                .insert(token.to_string(), INTERNAL_USER.to_string())
                .await;
            return Ok(INTERNAL_USER.to_string());
        }

        warn!("Rejected API token");
        Err(AuthError::InvalidToken)
    }

    /// Number of cached tokens.
    #[must_use]
    pub fn cached_entries(&self) -> u64 {
        self.cache.entry_count()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[derive(Clone, Default)]
    struct CountingStore {
        keys: HashMap<String, String>,
        calls: Arc<AtomicUsize>,
    }

    impl CountingStore {
        fn with_key(token: &str, username: &str) -> Self {
            let mut keys = HashMap::new();
            keys.insert(token.to_string(), username.to_string());
            Self {
                keys,
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl ApiKeyStore for CountingStore {
        async fn lookup(&self, token: &str) -> Result<Option<String>, RepositoryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.keys.get(token).cloned())
        }
    }

    struct FailingStore;

    impl ApiKeyStore for FailingStore {
        async fn lookup(&self, _token: &str) -> Result<Option<String>, RepositoryError> {
            Err(RepositoryError::DataCorruption("boom".to_string()))
        }
    }

    #[tokio::test]
    async fn test_empty_token() {
        let auth = AuthCache::new(CountingStore::default(), None, Duration::from_secs(60));
        assert!(matches!(
            auth.authenticate("").await,
            Err(AuthError::NotProvided)
        ));
    }

    #[tokio::test]
    async fn test_database_token_is_cached() {
        let store = CountingStore::with_key("tok-1", "sync");
        let auth = AuthCache::new(store.clone(), None, Duration::from_secs(60));

        assert_eq!(auth.authenticate("tok-1").await.ok().as_deref(), Some("sync"));
        assert_eq!(auth.authenticate("tok-1").await.ok().as_deref(), Some("sync"));
        assert_eq!(auth.authenticate("tok-1").await.ok().as_deref(), Some("sync"));

        assert_eq!(store.calls(), 1);
    }

    #[tokio::test]
    async fn test_expired_entry_is_looked_up_again() {
        let store = CountingStore::with_key("tok-1", "sync");
        let auth = AuthCache::new(store.clone(), None, Duration::from_millis(100));

        assert!(auth.authenticate("tok-1").await.is_ok());
        assert_eq!(store.calls(), 1);

        tokio::time::sleep(Duration::from_millis(300)).await;

        assert!(auth.authenticate("tok-1").await.is_ok());
        assert_eq!(store.calls(), 2);
    }

    #[tokio::test]
    async fn test_static_key_fallback() {
        let store = CountingStore::default();
        let auth = AuthCache::new(
            store.clone(),
            Some(SecretString::from("static-key".to_string())),
            Duration::from_secs(60),
        );

        assert_eq!(
            auth.authenticate("static-key").await.ok().as_deref(),
            Some(INTERNAL_USER)
        );
        assert_eq!(
            auth.authenticate("static-key").await.ok().as_deref(),
            Some(INTERNAL_USER)
        );
        assert_eq!(store.calls(), 1);
    }

    #[tokio::test]
    async fn test_invalid_token_is_not_cached() {
        let store = CountingStore::default();
        let auth = AuthCache::new(
            store.clone(),
            Some(SecretString::from("static-key".to_string())),
            Duration::from_secs(60),
        );

        assert!(matches!(
            auth.authenticate("wrong").await,
            Err(AuthError::InvalidToken)
        ));
        assert!(auth.authenticate("wrong").await.is_err());
        assert_eq!(store.calls(), 2);
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let auth = AuthCache::new(FailingStore, None, Duration::from_secs(60));
        assert!(matches!(
            auth.authenticate("tok").await,
            Err(AuthError::Lookup(_))
        ));
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"ab"));
    }
}
