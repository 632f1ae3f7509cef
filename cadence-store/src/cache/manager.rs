//! The resource cache manager.
//!
//! Decides per read whether a persisted snapshot may be reused or a fresh
//! network fetch is required, and downgrades to a stale snapshot when the
//! fetch fails.

use std::future::Future;
use std::sync::Arc;

use cadence_core::{CacheError, CadenceError, EpochMillis, StoreError};
use chrono::Utc;
use serde_json::Value;

use super::key::{CachePolicy, ResourceKey};
use super::read::CacheRead;
use crate::kv::KvStore;

fn now_ms() -> EpochMillis {
    Utc::now().timestamp_millis()
}

/// Keyed store of `{payload, fetched_at}` entries with independent validity
/// windows, over an injected [`KvStore`].
pub struct ResourceCache {
    store: Arc<dyn KvStore>,
    policy: CachePolicy,
}

impl ResourceCache {
    pub fn new(store: Arc<dyn KvStore>, policy: CachePolicy) -> Self {
        Self { store, policy }
    }

    pub fn with_defaults(store: Arc<dyn KvStore>) -> Self {
        Self::new(store, CachePolicy::default())
    }

    pub fn policy(&self) -> &CachePolicy {
        &self.policy
    }

    /// Is there a persisted entry for `key` inside its validity window?
    pub async fn is_valid(&self, key: ResourceKey) -> Result<bool, CacheError> {
        Ok(match self.load_entry(key).await? {
            Some((_, fetched_at)) => self.policy.is_valid_at(key, fetched_at, now_ms()),
            None => false,
        })
    }

    /// Read the entry for `key` if it is valid. An expired or malformed
    /// entry reads as absent.
    pub async fn read(&self, key: ResourceKey) -> Result<Option<CacheRead<Value>>, CacheError> {
        match self.load_entry(key).await? {
            Some((payload, fetched_at))
                if self.policy.is_valid_at(key, fetched_at, now_ms()) =>
            {
                Ok(Some(CacheRead::fresh_hit(payload, fetched_at)))
            }
            _ => Ok(None),
        }
    }

    /// Overwrite the entry for `key` with a fresh fetch timestamp.
    pub async fn write(&self, key: ResourceKey, payload: &Value) -> Result<(), CacheError> {
        let serialized = payload.to_string();
        let stamped_at = now_ms();
        self.store
            .set(key.as_str(), &serialized)
            .await
            .map_err(|source| Self::store_error(key, source))?;
        self.store
            .set(&key.fetched_at_key(), &stamped_at.to_string())
            .await
            .map_err(|source| Self::store_error(key, source))?;
        tracing::debug!(resource = %key, "cache entry written");
        Ok(())
    }

    /// Remove the entry (payload and timestamp) immediately. Used on logout
    /// and explicit force-refresh.
    pub async fn invalidate(&self, key: ResourceKey) -> Result<(), CacheError> {
        self.store
            .delete(key.as_str())
            .await
            .map_err(|source| Self::store_error(key, source))?;
        self.store
            .delete(&key.fetched_at_key())
            .await
            .map_err(|source| Self::store_error(key, source))?;
        Ok(())
    }

    /// Remove every resource entry.
    pub async fn invalidate_all(&self) -> Result<(), CacheError> {
        for key in ResourceKey::ALL {
            self.invalidate(key).await?;
        }
        Ok(())
    }

    /// Read the latest persisted entry regardless of validity. Local-first
    /// mutation applies on top of whatever snapshot exists; an expired one
    /// is still the best local truth available.
    pub async fn read_latest(
        &self,
        key: ResourceKey,
    ) -> Result<Option<(Value, EpochMillis)>, CacheError> {
        self.load_entry(key).await
    }

    /// Read through the cache: serve a valid entry, otherwise run `fetcher`
    /// and persist its result. When the fetch fails and any previous entry
    /// exists (even expired), that entry is served as a degraded fallback
    /// so the caller never regresses to "no data" on a transient failure.
    pub async fn fetch_with<F, Fut>(
        &self,
        key: ResourceKey,
        fetcher: F,
    ) -> Result<CacheRead<Value>, CacheError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, CadenceError>>,
    {
        let previous = self.load_entry(key).await?;
        if let Some((payload, fetched_at)) = &previous {
            if self.policy.is_valid_at(key, *fetched_at, now_ms()) {
                return Ok(CacheRead::fresh_hit(payload.clone(), *fetched_at));
            }
        }

        match fetcher().await {
            Ok(payload) => {
                self.write(key, &payload).await?;
                Ok(CacheRead::network_fill(payload, now_ms()))
            }
            Err(err) => match previous {
                Some((payload, fetched_at)) => {
                    tracing::warn!(
                        resource = %key,
                        error = %err,
                        "fetch failed, serving stale cache entry"
                    );
                    Ok(CacheRead::stale_fallback(payload, fetched_at))
                }
                None => Err(CacheError::FetchFailedNoFallback {
                    key: key.as_str().to_string(),
                    reason: err.to_string(),
                }),
            },
        }
    }

    /// Load a persisted entry without judging validity. Malformed payloads
    /// are dropped as if absent. A missing or unparsable timestamp maps to
    /// epoch zero: never valid, still usable as a fallback.
    async fn load_entry(
        &self,
        key: ResourceKey,
    ) -> Result<Option<(Value, EpochMillis)>, CacheError> {
        let raw = self
            .store
            .get(key.as_str())
            .await
            .map_err(|source| Self::store_error(key, source))?;
        let Some(raw) = raw else {
            return Ok(None);
        };

        let payload: Value = match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(err) => {
                tracing::debug!(resource = %key, error = %err, "dropping malformed cache entry");
                return Ok(None);
            }
        };

        let fetched_at = self
            .store
            .get(&key.fetched_at_key())
            .await
            .map_err(|source| Self::store_error(key, source))?
            .and_then(|ts| ts.parse::<EpochMillis>().ok())
            .unwrap_or(0);

        Ok(Some((payload, fetched_at)))
    }

    fn store_error(key: ResourceKey, source: StoreError) -> CacheError {
        CacheError::Store {
            key: key.as_str().to_string(),
            source,
        }
    }
}
