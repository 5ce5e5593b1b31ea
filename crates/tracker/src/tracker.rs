//! A single operation's poll loop.
//!
//! [`OperationTracker::spawn`] starts a task that polls the backend on a
//! fixed interval and publishes the merged [`OperationRecord`] through a
//! [`watch`] channel. The loop ends when a terminal snapshot arrives or
//! when [`OperationTracker::stop`] is called, whichever happens first.
//!
//! Applying a snapshot and stopping both run under the watch channel's
//! write lock, so once `stop` returns no further snapshot is applied.
//! Dropping the tracker stops the loop the same way, without an event.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use studio_client::OperationBackend;
use studio_core::operation::{
    ApplyOutcome, OperationKind, OperationRecord, OperationSnapshot, OperationStatus,
};
use studio_core::types::OperationId;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::config::TrackerConfig;
use crate::events::{StopReason, TrackerEvent};
use crate::poll::fetch_snapshot;

/// Handle to a running (or finished) poll loop.
pub struct OperationTracker {
    kind: OperationKind,
    id: OperationId,
    record_tx: Arc<watch::Sender<OperationRecord>>,
    stopped: Arc<AtomicBool>,
    cancel: CancellationToken,
    event_tx: broadcast::Sender<TrackerEvent>,
    task_handle: JoinHandle<()>,
}

impl OperationTracker {
    /// Start polling `id`. The first poll is issued immediately.
    pub fn spawn(
        backend: Arc<dyn OperationBackend>,
        kind: OperationKind,
        id: impl Into<OperationId>,
        config: TrackerConfig,
        event_tx: broadcast::Sender<TrackerEvent>,
    ) -> Self {
        let id = id.into();
        let (record_tx, _) = watch::channel(OperationRecord::new(kind, id.clone()));
        let record_tx = Arc::new(record_tx);
        let stopped = Arc::new(AtomicBool::new(false));
        let cancel = CancellationToken::new();

        tracing::info!(%kind, operation_id = %id, "Tracking operation");
        let _ = event_tx.send(TrackerEvent::Started {
            kind,
            operation_id: id.clone(),
        });

        let poll = PollLoop {
            backend,
            kind,
            id: id.clone(),
            config,
            record_tx: Arc::clone(&record_tx),
            stopped: Arc::clone(&stopped),
            cancel: cancel.clone(),
            event_tx: event_tx.clone(),
        };
        let task_handle = tokio::spawn(poll.run());

        Self {
            kind,
            id,
            record_tx,
            stopped,
            cancel,
            event_tx,
            task_handle,
        }
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    pub fn operation_id(&self) -> &str {
        &self.id
    }

    /// Whether the loop may still apply snapshots.
    pub fn is_running(&self) -> bool {
        !self.stopped.load(Ordering::SeqCst)
    }

    /// Latest record.
    pub fn record(&self) -> OperationRecord {
        self.record_tx.borrow().clone()
    }

    /// Receiver notified on every applied snapshot or failed tick.
    pub fn watch(&self) -> watch::Receiver<OperationRecord> {
        self.record_tx.subscribe()
    }

    /// Stop the loop and abandon any in-flight fetch.
    ///
    /// Returns `true` if this call stopped it, `false` if it had already
    /// stopped (terminal snapshot or an earlier call).
    pub fn stop(&self, reason: StopReason) -> bool {
        let mut first = false;
        self.record_tx.send_if_modified(|_| {
            first = !self.stopped.swap(true, Ordering::SeqCst);
            false
        });
        self.cancel.cancel();

        if first {
            tracing::info!(kind = %self.kind, operation_id = %self.id, ?reason, "Tracker stopped");
            let _ = self.event_tx.send(TrackerEvent::Stopped {
                kind: self.kind,
                operation_id: self.id.clone(),
                reason,
            });
        }
        first
    }

    /// Wait for the poll task to exit.
    pub async fn finished(mut self) {
        if let Err(e) = (&mut self.task_handle).await {
            tracing::error!(
                kind = %self.kind,
                operation_id = %self.id,
                error = %e,
                "Poll task panicked",
            );
        }
    }
}

impl Drop for OperationTracker {
    fn drop(&mut self) {
        self.record_tx.send_if_modified(|_| {
            self.stopped.store(true, Ordering::SeqCst);
            false
        });
        self.cancel.cancel();
    }
}

struct PollLoop {
    backend: Arc<dyn OperationBackend>,
    kind: OperationKind,
    id: OperationId,
    config: TrackerConfig,
    record_tx: Arc<watch::Sender<OperationRecord>>,
    stopped: Arc<AtomicBool>,
    cancel: CancellationToken,
    event_tx: broadcast::Sender<TrackerEvent>,
}

impl PollLoop {
    async fn run(self) {
        // At most one fetch in flight; late ticks are dropped, never queued.
        let mut ticker = tokio::time::interval(self.config.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let result = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                result = fetch_snapshot(self.backend.as_ref(), self.kind, &self.id) => result,
            };

            let keep_going = match result {
                Ok(snapshot) => self.apply(snapshot),
                Err(e) => self.poll_failed(e.to_string()),
            };
            if !keep_going {
                break;
            }
        }

        tracing::debug!(kind = %self.kind, operation_id = %self.id, "Poll loop exited");
    }

    /// Merge a snapshot. Returns `false` when the loop should end.
    fn apply(&self, snapshot: OperationSnapshot) -> bool {
        let mut applied: Option<(ApplyOutcome, OperationRecord)> = None;
        self.record_tx.send_if_modified(|record| {
            if self.stopped.load(Ordering::SeqCst) {
                return false;
            }
            let outcome = record.apply(snapshot);
            if outcome == ApplyOutcome::Terminal {
                self.stopped.store(true, Ordering::SeqCst);
            }
            let modified = outcome != ApplyOutcome::IgnoredAfterTerminal;
            applied = Some((outcome, record.clone()));
            modified
        });

        match applied {
            Some((ApplyOutcome::InFlight, record)) => {
                tracing::debug!(
                    kind = %self.kind,
                    operation_id = %self.id,
                    status = %record.status,
                    progress = record.progress,
                    "Operation progress",
                );
                let _ = self.event_tx.send(TrackerEvent::Progress {
                    kind: self.kind,
                    operation_id: self.id.clone(),
                    status: record.status,
                    progress: record.progress,
                });
                true
            }
            Some((ApplyOutcome::Terminal, record)) => {
                self.finish(record);
                false
            }
            Some((ApplyOutcome::IgnoredAfterTerminal, _)) | None => false,
        }
    }

    /// Record a failed tick. Returns `false` if the tracker was stopped.
    fn poll_failed(&self, message: String) -> bool {
        let mut recorded = false;
        self.record_tx.send_if_modified(|record| {
            if self.stopped.load(Ordering::SeqCst) {
                return false;
            }
            record.record_poll_failure(message.clone());
            recorded = true;
            true
        });
        if !recorded {
            return false;
        }

        tracing::warn!(
            kind = %self.kind,
            operation_id = %self.id,
            error = %message,
            "Status poll failed",
        );
        let _ = self.event_tx.send(TrackerEvent::PollFailed {
            kind: self.kind,
            operation_id: self.id.clone(),
            message,
        });
        true
    }

    fn finish(&self, record: OperationRecord) {
        let event = if record.status == OperationStatus::Done {
            tracing::info!(
                kind = %self.kind,
                operation_id = %self.id,
                result_ref = ?record.result_ref,
                "Operation completed",
            );
            TrackerEvent::Completed {
                kind: self.kind,
                operation_id: self.id.clone(),
                result_ref: record.result_ref,
            }
        } else {
            let last_log = record.logs.last().cloned();
            tracing::warn!(
                kind = %self.kind,
                operation_id = %self.id,
                ?last_log,
                "Operation failed",
            );
            TrackerEvent::Failed {
                kind: self.kind,
                operation_id: self.id.clone(),
                last_log,
            }
        };
        let _ = self.event_tx.send(event);
        let _ = self.event_tx.send(TrackerEvent::Stopped {
            kind: self.kind,
            operation_id: self.id.clone(),
            reason: StopReason::Terminal,
        });
        self.cancel.cancel();
    }
}
