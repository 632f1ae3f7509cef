//! Cache read wrapper carrying staleness provenance.
//!
//! Callers always learn how a value reached them; the cache never hides a
//! degraded read behind a "best effort" abstraction.

use cadence_core::EpochMillis;

/// How the returned value was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadProvenance {
    /// Served from a cache entry inside its validity window.
    FreshHit,
    /// Fetched from the network and written to the cache on the way out.
    NetworkFill,
    /// The fetch failed; a previous (possibly expired) entry was served so
    /// the caller does not regress to an empty state.
    StaleFallback,
}

/// Result of a cache read, carrying staleness metadata.
#[derive(Debug, Clone)]
pub struct CacheRead<T> {
    value: T,
    fetched_at_ms: EpochMillis,
    provenance: ReadProvenance,
}

impl<T> CacheRead<T> {
    pub fn fresh_hit(value: T, fetched_at_ms: EpochMillis) -> Self {
        Self {
            value,
            fetched_at_ms,
            provenance: ReadProvenance::FreshHit,
        }
    }

    pub fn network_fill(value: T, fetched_at_ms: EpochMillis) -> Self {
        Self {
            value,
            fetched_at_ms,
            provenance: ReadProvenance::NetworkFill,
        }
    }

    pub fn stale_fallback(value: T, fetched_at_ms: EpochMillis) -> Self {
        Self {
            value,
            fetched_at_ms,
            provenance: ReadProvenance::StaleFallback,
        }
    }

    /// Consume the wrapper and return the underlying value.
    pub fn into_value(self) -> T {
        self.value
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    /// When the value was fetched from the network (for a fallback, the
    /// original fetch time of the entry being served).
    pub fn fetched_at_ms(&self) -> EpochMillis {
        self.fetched_at_ms
    }

    pub fn provenance(&self) -> ReadProvenance {
        self.provenance
    }

    /// True when the fetch failed and a previous entry was served instead.
    /// Such a value carries an implicit "may be outdated" contract.
    pub fn is_stale_fallback(&self) -> bool {
        self.provenance == ReadProvenance::StaleFallback
    }

    /// Age of the value relative to `now_ms`.
    pub fn age_ms(&self, now_ms: EpochMillis) -> EpochMillis {
        now_ms.saturating_sub(self.fetched_at_ms)
    }

    /// Map the inner value to a new type, preserving provenance.
    pub fn map<U, F>(self, f: F) -> CacheRead<U>
    where
        F: FnOnce(T) -> U,
    {
        CacheRead {
            value: f(self.value),
            fetched_at_ms: self.fetched_at_ms,
            provenance: self.provenance,
        }
    }

    /// Map the inner value fallibly, preserving provenance on success.
    pub fn try_map<U, E, F>(self, f: F) -> Result<CacheRead<U>, E>
    where
        F: FnOnce(T) -> Result<U, E>,
    {
        Ok(CacheRead {
            value: f(self.value)?,
            fetched_at_ms: self.fetched_at_ms,
            provenance: self.provenance,
        })
    }
}

impl<T> AsRef<T> for CacheRead<T> {
    fn as_ref(&self) -> &T {
        &self.value
    }
}
