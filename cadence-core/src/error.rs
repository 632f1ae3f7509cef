//! Error types for Cadence client operations

use thiserror::Error;

/// Authorization errors, split by whether the refresh protocol can recover.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    /// 401 on a request eligible for refresh-and-retry. Recovered inside the
    /// gateway; callers only see it when the refresh path is unavailable.
    #[error("Authorization failed, refresh pending")]
    Transient,

    /// Refresh itself failed, the request was already retried once, or the
    /// request was an auth-surface call. Credentials are cleared.
    #[error("Authorization terminally failed: {reason}")]
    Terminal { reason: String },

    /// No stored refresh token to run the refresh protocol with.
    #[error("No refresh token available")]
    MissingRefreshToken,
}

/// Transport-level errors unrelated to authorization. Passed through to the
/// caller unchanged.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("Network error: {reason}")]
    Network { reason: String },

    #[error("Request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Unexpected response (status {status}): {reason}")]
    InvalidResponse { status: u16, reason: String },

    #[error("Serialization error: {reason}")]
    Serialization { reason: String },
}

/// Persistent key-value store errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Failed to open store at {path}: {reason}")]
    Open { path: String, reason: String },

    #[error("Read failed for key {key}: {reason}")]
    Read { key: String, reason: String },

    #[error("Write failed for key {key}: {reason}")]
    Write { key: String, reason: String },

    #[error("Delete failed for key {key}: {reason}")]
    Delete { key: String, reason: String },
}

/// Cache-layer errors. A cache miss is NOT an error (expressed as `None`);
/// these cover only failures of the layer itself.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("Store error for resource {key}: {source}")]
    Store {
        key: String,
        #[source]
        source: StoreError,
    },

    #[error("Fetch failed for resource {key} with no cached fallback: {reason}")]
    FetchFailedNoFallback { key: String, reason: String },
}

/// Master error type for all Cadence client errors.
#[derive(Debug, Clone, Error)]
pub enum CadenceError {
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),
}

/// Result type alias for Cadence client operations.
pub type CadenceResult<T> = Result<T, CadenceError>;
