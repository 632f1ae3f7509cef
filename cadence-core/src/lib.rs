//! Cadence Core - Client Data Types
//!
//! Pure data structures with no behavior. All other crates depend on this.
//! This crate contains ONLY data types and pure predicates - no I/O, no
//! business logic.

use chrono::{DateTime, Utc};
use uuid::Uuid;

pub mod content;
pub mod credentials;
pub mod envelope;
pub mod error;
pub mod signal;

pub use content::{
    ContentId, ContentItem, ContentPatch, ContentStats, ContentStatus, LibrarySnapshot,
    UserProfile,
};
pub use credentials::CredentialPair;
pub use envelope::{ApiEnvelope, AuthPayload, LoginRequest, RefreshRequest, RefreshResponse, SignupRequest};
pub use error::{AuthError, CacheError, CadenceError, CadenceResult, StoreError, TransportError};
pub use signal::SyncSignal;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Milliseconds since the Unix epoch, as reported by the server and the
/// persistent store.
pub type EpochMillis = i64;

/// Correlation identifier using UUIDv7 for timestamp-sortable IDs.
/// Attached to optimistic mutations so reconciliation outcomes can be tied
/// back to the local write that produced them.
pub type CorrelationId = Uuid;

/// Generate a new UUIDv7 correlation id (timestamp-sortable).
pub fn new_correlation_id() -> CorrelationId {
    Uuid::now_v7()
}

/// Convert a UTC timestamp to epoch milliseconds.
pub fn to_epoch_millis(ts: Timestamp) -> EpochMillis {
    ts.timestamp_millis()
}
