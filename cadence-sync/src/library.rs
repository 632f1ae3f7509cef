//! Optimistic mutation propagator for the content collection.
//!
//! Mutations apply to the cached snapshot immediately and never wait for
//! the server. Each operation rebuilds the full collection, re-derives the
//! aggregate from it, and persists profile + aggregate + collection as one
//! combined write, then fires a background reconciliation call through the
//! gateway. A failed reconciliation keeps the optimistic state; the next
//! full bundle refresh converges it with server truth.

use std::sync::Arc;

use cadence_core::{
    new_correlation_id, CadenceResult, ContentId, ContentItem, ContentPatch, CorrelationId,
    LibrarySnapshot,
};
use cadence_store::{ResourceCache, ResourceKey};
use serde_json::Value;
use tokio::task::JoinHandle;

use crate::gateway::RequestGateway;
use crate::stats::derive_stats_now;
use crate::transport::RequestDescriptor;

const CONTENT_PATH: &str = "/api/v1/content";

/// Outcome of the background reconciliation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconciliationOutcome {
    /// The server accepted the mutation.
    Confirmed,
    /// The call failed; the optimistic local state stands unchanged.
    Failed { reason: String },
}

/// Non-blocking handle to a spawned reconciliation. Dropping it detaches
/// the call; awaiting `outcome` is purely informational.
pub struct ReconciliationHandle {
    correlation_id: CorrelationId,
    task: JoinHandle<ReconciliationOutcome>,
}

impl ReconciliationHandle {
    pub fn correlation_id(&self) -> CorrelationId {
        self.correlation_id
    }

    pub async fn outcome(self) -> ReconciliationOutcome {
        self.task.await.unwrap_or(ReconciliationOutcome::Failed {
            reason: "reconciliation task aborted".to_string(),
        })
    }
}

/// Applies local mutations to the cached content collection and keeps the
/// derived aggregate consistent with it.
pub struct ContentLibrary {
    cache: Arc<ResourceCache>,
    gateway: Arc<RequestGateway>,
}

impl ContentLibrary {
    pub fn new(cache: Arc<ResourceCache>, gateway: Arc<RequestGateway>) -> Self {
        Self { cache, gateway }
    }

    /// Append a record and persist the rebuilt snapshot.
    pub async fn add(&self, item: ContentItem) -> CadenceResult<ReconciliationHandle> {
        let body = serde_json::to_value(&item).unwrap_or(Value::Null);
        self.mutate(|items| {
            let mut next = items;
            next.push(item);
            next
        })
        .await?;
        Ok(self.reconcile(RequestDescriptor::post(CONTENT_PATH, body)))
    }

    /// Replace the record with `id` by its patched version and persist the
    /// rebuilt snapshot. A missing id leaves the collection unchanged; the
    /// reconciliation call still runs so server truth settles the question.
    pub async fn update(
        &self,
        id: &ContentId,
        patch: ContentPatch,
    ) -> CadenceResult<ReconciliationHandle> {
        let body = serde_json::to_value(&patch).unwrap_or(Value::Null);
        self.mutate(|items| {
            items
                .into_iter()
                .map(|item| {
                    if item.id == *id {
                        item.with_patch(&patch)
                    } else {
                        item
                    }
                })
                .collect()
        })
        .await?;
        Ok(self.reconcile(RequestDescriptor::patch(
            format!("{CONTENT_PATH}/{id}"),
            body,
        )))
    }

    /// Filter the record with `id` out and persist the rebuilt snapshot.
    pub async fn remove(&self, id: &ContentId) -> CadenceResult<ReconciliationHandle> {
        self.mutate(|items| items.into_iter().filter(|item| item.id != *id).collect())
            .await?;
        Ok(self.reconcile(RequestDescriptor::delete(format!("{CONTENT_PATH}/{id}"))))
    }

    /// The current snapshot as the mutations see it.
    pub async fn snapshot(&self) -> CadenceResult<LibrarySnapshot> {
        let latest = self.cache.read_latest(ResourceKey::ProfileBundle).await?;
        Ok(latest
            .and_then(|(payload, _)| serde_json::from_value(payload).ok())
            .unwrap_or_default())
    }

    /// Rebuild the collection through `rebuild`, re-derive the aggregate,
    /// and write the combined snapshot in a single cache operation.
    async fn mutate<F>(&self, rebuild: F) -> CadenceResult<()>
    where
        F: FnOnce(Vec<ContentItem>) -> Vec<ContentItem>,
    {
        let mut snapshot = self.snapshot().await?;
        snapshot.items = rebuild(snapshot.items);
        snapshot.stats = derive_stats_now(&snapshot.items);

        let payload = serde_json::to_value(&snapshot).unwrap_or(Value::Null);
        self.cache
            .write(ResourceKey::ProfileBundle, &payload)
            .await?;
        Ok(())
    }

    /// Fire the background call. Local state is already persisted; this
    /// never blocks or rolls it back.
    fn reconcile(&self, request: RequestDescriptor) -> ReconciliationHandle {
        let correlation_id = new_correlation_id();
        let gateway = self.gateway.clone();
        let task = tokio::spawn(async move {
            match gateway.send(request).await {
                Ok(_) => {
                    tracing::debug!(%correlation_id, "mutation reconciliation confirmed");
                    ReconciliationOutcome::Confirmed
                }
                Err(err) => {
                    tracing::warn!(
                        %correlation_id,
                        error = %err,
                        "mutation reconciliation failed, keeping optimistic state"
                    );
                    ReconciliationOutcome::Failed {
                        reason: err.to_string(),
                    }
                }
            }
        });
        ReconciliationHandle {
            correlation_id,
            task,
        }
    }
}
