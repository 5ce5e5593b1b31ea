//! Lifecycle events published by trackers.
//!
//! Subscribers (the console session, log sinks) receive these through
//! [`TrackerRegistry::subscribe`](crate::TrackerRegistry::subscribe).

use serde::Serialize;
use studio_core::operation::{OperationKind, OperationStatus};
use studio_core::types::OperationId;

/// Why a poll loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The backend reported `done` or `error`.
    Terminal,
    /// The caller stopped the tracker.
    Requested,
    /// A newer operation of the same kind replaced it.
    Superseded,
    /// The registry is shutting down.
    Shutdown,
}

/// An event about one tracked operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TrackerEvent {
    /// Polling began.
    Started {
        kind: OperationKind,
        operation_id: OperationId,
    },

    /// A non-terminal snapshot was applied.
    Progress {
        kind: OperationKind,
        operation_id: OperationId,
        status: OperationStatus,
        progress: u8,
    },

    /// A poll tick failed; the loop keeps going.
    PollFailed {
        kind: OperationKind,
        operation_id: OperationId,
        message: String,
    },

    /// The operation reached `done`.
    Completed {
        kind: OperationKind,
        operation_id: OperationId,
        /// Output video URL or download directory, if reported.
        result_ref: Option<String>,
    },

    /// The operation reached `error`.
    Failed {
        kind: OperationKind,
        operation_id: OperationId,
        /// Last backend log line, if any.
        last_log: Option<String>,
    },

    /// The poll loop was stopped. Sent exactly once per tracker.
    Stopped {
        kind: OperationKind,
        operation_id: OperationId,
        reason: StopReason,
    },
}

impl TrackerEvent {
    pub fn kind(&self) -> OperationKind {
        match self {
            TrackerEvent::Started { kind, .. }
            | TrackerEvent::Progress { kind, .. }
            | TrackerEvent::PollFailed { kind, .. }
            | TrackerEvent::Completed { kind, .. }
            | TrackerEvent::Failed { kind, .. }
            | TrackerEvent::Stopped { kind, .. } => *kind,
        }
    }

    pub fn operation_id(&self) -> &str {
        match self {
            TrackerEvent::Started { operation_id, .. }
            | TrackerEvent::Progress { operation_id, .. }
            | TrackerEvent::PollFailed { operation_id, .. }
            | TrackerEvent::Completed { operation_id, .. }
            | TrackerEvent::Failed { operation_id, .. }
            | TrackerEvent::Stopped { operation_id, .. } => operation_id,
        }
    }

    /// `Completed` or `Failed`.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TrackerEvent::Completed { .. } | TrackerEvent::Failed { .. }
        )
    }
}
