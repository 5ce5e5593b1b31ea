//! One tracker slot per operation kind.
//!
//! [`TrackerRegistry`] is the single owner of poll loop lifetimes.
//! Registering a tracker for a kind stops the previous one first, so two
//! loops for the same kind never run side by side. Events from every
//! tracker are published on one [`broadcast`] channel; call
//! [`TrackerRegistry::subscribe`] to receive them.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use studio_client::OperationBackend;
use studio_core::operation::{OperationKind, OperationRecord};
use studio_core::types::OperationId;
use tokio::sync::{broadcast, watch};

use crate::config::TrackerConfig;
use crate::events::{StopReason, TrackerEvent};
use crate::tracker::OperationTracker;

/// Broadcast channel capacity for tracker events.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// How long shutdown waits for each poll task to exit.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

pub struct TrackerRegistry {
    backend: Arc<dyn OperationBackend>,
    config: TrackerConfig,
    trackers: HashMap<OperationKind, OperationTracker>,
    event_tx: broadcast::Sender<TrackerEvent>,
}

impl TrackerRegistry {
    pub fn new(backend: Arc<dyn OperationBackend>, config: TrackerConfig) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            backend,
            config,
            trackers: HashMap::new(),
            event_tx,
        }
    }

    /// Subscribe to events from all trackers.
    pub fn subscribe(&self) -> broadcast::Receiver<TrackerEvent> {
        self.event_tx.subscribe()
    }

    /// Start tracking `id`, superseding any tracker of the same kind.
    pub fn start(&mut self, kind: OperationKind, id: impl Into<OperationId>) {
        let tracker = OperationTracker::spawn(
            Arc::clone(&self.backend),
            kind,
            id,
            self.config,
            self.event_tx.clone(),
        );
        self.register(tracker);
    }

    /// Install `tracker` in its kind's slot, stopping the one it replaces.
    pub fn register(&mut self, tracker: OperationTracker) {
        if let Some(previous) = self.trackers.insert(tracker.kind(), tracker) {
            previous.stop(StopReason::Superseded);
        }
    }

    /// Stop the tracker of `kind`. Returns `false` if none was running.
    /// The record stays readable until the slot is reused.
    pub fn stop(&mut self, kind: OperationKind) -> bool {
        self.trackers
            .get(&kind)
            .is_some_and(|tracker| tracker.stop(StopReason::Requested))
    }

    /// Whether a poll loop for `kind` is live.
    pub fn is_active(&self, kind: OperationKind) -> bool {
        self.trackers.get(&kind).is_some_and(OperationTracker::is_running)
    }

    /// Kinds with a live poll loop.
    pub fn active_kinds(&self) -> Vec<OperationKind> {
        OperationKind::ALL
            .into_iter()
            .filter(|kind| self.is_active(*kind))
            .collect()
    }

    /// Latest record of the last operation tracked for `kind`.
    pub fn record(&self, kind: OperationKind) -> Option<OperationRecord> {
        self.trackers.get(&kind).map(OperationTracker::record)
    }

    pub fn watch(&self, kind: OperationKind) -> Option<watch::Receiver<OperationRecord>> {
        self.trackers.get(&kind).map(OperationTracker::watch)
    }

    /// Stop every tracker and wait for their tasks to exit.
    pub async fn shutdown(&mut self) {
        tracing::info!(count = self.trackers.len(), "Shutting down tracker registry");

        for (kind, tracker) in self.trackers.drain() {
            tracker.stop(StopReason::Shutdown);
            if tokio::time::timeout(SHUTDOWN_TIMEOUT, tracker.finished())
                .await
                .is_err()
            {
                tracing::warn!(%kind, "Poll task did not exit in time");
            }
        }

        tracing::info!("Tracker registry shut down complete");
    }
}
