//! Cadence Store - Persistent Key-Value Abstraction and Resource Cache
//!
//! Defines the injected `get/set/delete` store interface the sync layer
//! persists through, plus the TTL-based resource cache built on top of it.
//! The actual browser-storage analog is pluggable: an in-memory backend for
//! tests and ephemeral sessions, an LMDB backend for durable ones.

pub mod cache;
pub mod kv;
pub mod lmdb;

pub use cache::{CachePolicy, CacheRead, ReadProvenance, ResourceCache, ResourceKey, TtlClass};
pub use kv::{KvStore, MemoryStore};
pub use lmdb::{LmdbStore, LmdbStoreError};
