//! # Access Token Cache
//!
//! Client-credentials tokens are cached until shortly before they expire.
//! The clock is always passed in, so expiry can be tested without sleeping.
//!
//! ```text
//! issued at t, expires_in = 3600s
//!   valid while now < t + 3600s - 60s
//! ```

use std::future::Future;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::error::MdLabelError;

/// Tokens are refreshed this long before the issuer says they expire.
pub const REFRESH_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires_at: Instant,
}

/// A single cached bearer token.
///
/// Refreshes are serialized: concurrent callers of
/// [`get_or_refresh`](Self::get_or_refresh) wait on the same lock, and only
/// the first one to find the cache stale fetches a new token.
#[derive(Debug, Default)]
pub struct TokenCache {
    slot: Mutex<Option<CachedToken>>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached token, if it is still valid at `now`.
    pub async fn valid_token(&self, now: Instant) -> Option<String> {
        let slot = self.slot.lock().await;
        fresh(&slot, now)
    }

    /// Cache `token`, issued at `now` and valid for `expires_in` seconds.
    pub async fn store(&self, token: impl Into<String>, expires_in: u64, now: Instant) {
        let mut slot = self.slot.lock().await;
        *slot = Some(entry(token.into(), expires_in, now));
    }

    pub async fn invalidate(&self) {
        self.slot.lock().await.take();
    }

    /// Return the cached token, or run `fetch` and cache its
    /// `(token, expires_in_seconds)` result.
    pub async fn get_or_refresh<F, Fut>(&self, fetch: F) -> Result<String, MdLabelError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(String, u64), MdLabelError>>,
    {
        let mut slot = self.slot.lock().await;
        if let Some(token) = fresh(&slot, Instant::now()) {
            return Ok(token);
        }

        let (token, expires_in) = fetch().await?;
        tracing::debug!(expires_in, "access token refreshed");
        *slot = Some(entry(token.clone(), expires_in, Instant::now()));
        Ok(token)
    }
}

fn entry(token: String, expires_in: u64, now: Instant) -> CachedToken {
    let lifetime = Duration::from_secs(expires_in).saturating_sub(REFRESH_MARGIN);
    CachedToken {
        token,
        expires_at: now + lifetime,
    }
}

fn fresh(slot: &Option<CachedToken>, now: Instant) -> Option<String> {
    slot.as_ref()
        .filter(|cached| now < cached.expires_at)
        .map(|cached| cached.token.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_empty_cache_has_no_token() {
        let cache = TokenCache::new();
        assert_eq!(cache.valid_token(Instant::now()).await, None);
    }

    #[tokio::test]
    async fn test_token_expires_a_minute_early() {
        let cache = TokenCache::new();
        let t0 = Instant::now();
        cache.store("abc", 3600, t0).await;

        let just_before = t0 + Duration::from_secs(3539);
        let at_margin = t0 + Duration::from_secs(3540);
        assert_eq!(cache.valid_token(just_before).await.as_deref(), Some("abc"));
        assert_eq!(cache.valid_token(at_margin).await, None);
    }

    #[tokio::test]
    async fn test_short_lived_token_is_never_valid() {
        let cache = TokenCache::new();
        let t0 = Instant::now();
        cache.store("abc", 30, t0).await;
        assert_eq!(cache.valid_token(t0).await, None);
    }

    #[tokio::test]
    async fn test_invalidate() {
        let cache = TokenCache::new();
        let t0 = Instant::now();
        cache.store("abc", 3600, t0).await;
        cache.invalidate().await;
        assert_eq!(cache.valid_token(t0).await, None);
    }

    #[tokio::test]
    async fn test_get_or_refresh_fetches_once() {
        let cache = TokenCache::new();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let token = cache
                .get_or_refresh(|| async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(("fresh".to_string(), 3600))
                })
                .await
                .unwrap();
            assert_eq!(token, "fresh");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_refresh_leaves_cache_empty() {
        let cache = TokenCache::new();
        let result = cache
            .get_or_refresh(|| async { Err(MdLabelError::Catalog("denied".into())) })
            .await;
        assert!(result.is_err());
        assert_eq!(cache.valid_token(Instant::now()).await, None);
    }
}
