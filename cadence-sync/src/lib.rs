//! Cadence Sync - Client Data Synchronization Layer
//!
//! The concurrency-bearing core of the Cadence client: an authenticated
//! request gateway with single-flight credential refresh, independently-aged
//! resource caches with stale fallback, and optimistic local mutations with
//! full stats re-derivation. Everything else in the client is
//! call-then-render; this crate is where the coordination lives.
//!
//! No process entry point: this is a library consumed by UI code. All
//! collaborators (store, transport, signal bus) are injected.

pub mod client;
pub mod config;
pub mod credentials;
pub mod gateway;
pub mod library;
pub mod signals;
pub mod stats;
pub mod transport;

pub use client::SyncClient;
pub use config::{ConfigError, StoreConfig, SyncConfig, TtlConfig};
pub use credentials::CredentialStore;
pub use gateway::RequestGateway;
pub use library::{ContentLibrary, ReconciliationHandle, ReconciliationOutcome};
pub use signals::SignalBus;
pub use stats::{derive_stats, derive_stats_now};
pub use transport::{HttpReply, HttpTransport, Method, RequestDescriptor, RequestKind, Transport};
