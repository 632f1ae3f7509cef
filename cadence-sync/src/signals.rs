//! Typed signal bus for cross-context resynchronization.
//!
//! Long-lived consumers (polling loops, other views) subscribe here instead
//! of re-reading storage. Emission never blocks: a bus with no subscribers,
//! or a lagging subscriber, drops signals rather than stalling the sync
//! path.

use cadence_core::SyncSignal;
use tokio::sync::broadcast;

const DEFAULT_CAPACITY: usize = 16;

/// Injected pub/sub channel carrying [`SyncSignal`]s.
#[derive(Debug, Clone)]
pub struct SignalBus {
    sender: broadcast::Sender<SyncSignal>,
}

impl SignalBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SyncSignal> {
        self.sender.subscribe()
    }

    /// Broadcast a signal to all current subscribers.
    pub fn emit(&self, signal: SyncSignal) {
        // A send error only means there are no subscribers right now.
        let _ = self.sender.send(signal);
    }
}

impl Default for SignalBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
