//! Typed cross-context signals.
//!
//! Replaces ambient storage-change events with an explicit enum carried by
//! an injected bus. Consumers resynchronize on these instead of re-polling
//! the store.

use serde::{Deserialize, Serialize};

/// Signals broadcast by the sync layer to long-lived consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncSignal {
    /// A refresh or login installed a new credential pair.
    CredentialsUpdated,
    /// The cached user profile changed.
    UserUpdated,
    /// Credentials were cleared (logout or terminal auth failure).
    CredentialsCleared,
}
