//! Tracked long-running operations (generation jobs, model downloads).
//!
//! An [`OperationRecord`] pairs an immutable identity with the latest
//! status snapshot polled from the backend. Snapshots are merged with
//! [`OperationRecord::apply`]; transport failures are recorded with
//! [`OperationRecord::record_poll_failure`] without touching the last
//! known snapshot.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{OperationId, Timestamp};

// ---------------------------------------------------------------------------
// Status vocabulary
// ---------------------------------------------------------------------------

/// Operation is accepted but not started.
pub const STATUS_QUEUED: &str = "queued";
/// Operation is executing.
pub const STATUS_RUNNING: &str = "running";
/// Operation finished successfully.
pub const STATUS_DONE: &str = "done";
/// Operation failed or was cancelled.
pub const STATUS_ERROR: &str = "error";

/// Upper bound of the progress percentage.
pub const MAX_PROGRESS: u8 = 100;

// ---------------------------------------------------------------------------
// OperationKind
// ---------------------------------------------------------------------------

/// Which endpoint family an operation belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    GenerationJob,
    ModelDownload,
}

impl OperationKind {
    pub const ALL: [OperationKind; 2] =
        [OperationKind::GenerationJob, OperationKind::ModelDownload];

    pub fn as_str(self) -> &'static str {
        match self {
            OperationKind::GenerationJob => "generation_job",
            OperationKind::ModelDownload => "model_download",
        }
    }

    /// Whether the backend exposes a cancel command for this kind.
    pub fn is_cancellable(self) -> bool {
        matches!(self, OperationKind::GenerationJob)
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// OperationStatus
// ---------------------------------------------------------------------------

/// Backend status value.
///
/// The backend owns the vocabulary; only `done` and `error` carry meaning
/// for the tracker. Unknown values (e.g. `downloading`) round-trip through
/// [`OperationStatus::Other`] unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OperationStatus {
    Queued,
    Running,
    Done,
    Error,
    Other(String),
}

impl OperationStatus {
    pub fn as_str(&self) -> &str {
        match self {
            OperationStatus::Queued => STATUS_QUEUED,
            OperationStatus::Running => STATUS_RUNNING,
            OperationStatus::Done => STATUS_DONE,
            OperationStatus::Error => STATUS_ERROR,
            OperationStatus::Other(s) => s,
        }
    }

    /// `done` and `error` are terminal; nothing follows them.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OperationStatus::Done | OperationStatus::Error)
    }
}

impl From<&str> for OperationStatus {
    fn from(value: &str) -> Self {
        match value {
            STATUS_QUEUED => OperationStatus::Queued,
            STATUS_RUNNING => OperationStatus::Running,
            STATUS_DONE => OperationStatus::Done,
            STATUS_ERROR => OperationStatus::Error,
            other => OperationStatus::Other(other.to_string()),
        }
    }
}

impl From<String> for OperationStatus {
    fn from(value: String) -> Self {
        OperationStatus::from(value.as_str())
    }
}

impl From<OperationStatus> for String {
    fn from(value: OperationStatus) -> Self {
        match value {
            OperationStatus::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// One polled status response, normalized across endpoint families.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationSnapshot {
    pub status: OperationStatus,
    pub progress: u8,
    pub logs: Vec<String>,
    pub preview_ref: Option<String>,
    pub result_ref: Option<String>,
}

impl OperationSnapshot {
    /// Build a snapshot from a raw wire progress value.
    ///
    /// The value is clamped into `0..=100` on its own; it is never compared
    /// with a previous value since the backend does not guarantee
    /// monotonic progress.
    pub fn new(status: impl Into<OperationStatus>, raw_progress: i64, logs: Vec<String>) -> Self {
        Self {
            status: status.into(),
            progress: clamp_progress(raw_progress),
            logs,
            preview_ref: None,
            result_ref: None,
        }
    }

    pub fn with_preview_ref(mut self, preview_ref: Option<String>) -> Self {
        self.preview_ref = preview_ref;
        self
    }

    pub fn with_result_ref(mut self, result_ref: Option<String>) -> Self {
        self.result_ref = result_ref;
        self
    }
}

/// Clamp a raw wire progress value into `0..=100`.
pub fn clamp_progress(raw: i64) -> u8 {
    raw.clamp(0, MAX_PROGRESS as i64) as u8
}

/// Result of merging a snapshot into a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Snapshot applied; the operation is still in flight.
    InFlight,
    /// Snapshot applied and it was terminal.
    Terminal,
    /// Record was already terminal; the snapshot was dropped.
    IgnoredAfterTerminal,
}

// ---------------------------------------------------------------------------
// OperationRecord
// ---------------------------------------------------------------------------

/// Local view of one tracked operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationRecord {
    id: OperationId,
    kind: OperationKind,
    pub status: OperationStatus,
    pub progress: u8,
    pub logs: Vec<String>,
    pub preview_ref: Option<String>,
    pub result_ref: Option<String>,
    /// Message of the last failed poll, cleared by the next snapshot.
    pub poll_error: Option<String>,
    /// Number of snapshots applied so far.
    pub polls: u32,
    pub updated_at: Option<Timestamp>,
}

impl OperationRecord {
    /// A freshly created operation, before its first snapshot.
    pub fn new(kind: OperationKind, id: impl Into<OperationId>) -> Self {
        Self {
            id: id.into(),
            kind,
            status: OperationStatus::Queued,
            progress: 0,
            logs: Vec::new(),
            preview_ref: None,
            result_ref: None,
            poll_error: None,
            polls: 0,
            updated_at: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Merge a polled snapshot.
    ///
    /// `status`, `progress` and `logs` are replaced outright. The locators
    /// only ever appear once known, so an absent locator keeps the previous
    /// value.
    pub fn apply(&mut self, snapshot: OperationSnapshot) -> ApplyOutcome {
        if self.is_terminal() {
            return ApplyOutcome::IgnoredAfterTerminal;
        }

        self.status = snapshot.status;
        self.progress = snapshot.progress;
        self.logs = snapshot.logs;
        if snapshot.preview_ref.is_some() {
            self.preview_ref = snapshot.preview_ref;
        }
        if snapshot.result_ref.is_some() {
            self.result_ref = snapshot.result_ref;
        }
        self.poll_error = None;
        self.polls += 1;
        self.updated_at = Some(chrono::Utc::now());

        if self.is_terminal() {
            ApplyOutcome::Terminal
        } else {
            ApplyOutcome::InFlight
        }
    }

    /// Record a failed poll tick. The last snapshot is kept.
    pub fn record_poll_failure(&mut self, message: impl Into<String>) {
        self.poll_error = Some(message.into());
    }

    /// Status line shown next to the progress bar.
    pub fn status_line(&self) -> String {
        if self.poll_error.is_some() {
            STATUS_ERROR.to_string()
        } else {
            format!("{} ({}%)", self.status, self.progress)
        }
    }

    /// Progress shown on the bar; a failed tick shows an empty bar.
    pub fn display_progress(&self) -> u8 {
        if self.poll_error.is_some() {
            0
        } else {
            self.progress
        }
    }

    /// Control gating derived from this record while it is tracked.
    pub fn controls(&self) -> ControlGates {
        if self.is_terminal() {
            return ControlGates::idle();
        }
        ControlGates {
            trigger_enabled: self.poll_error.is_some(),
            cancel_enabled: self.kind.is_cancellable() && self.polls > 0,
        }
    }
}

// ---------------------------------------------------------------------------
// ControlGates
// ---------------------------------------------------------------------------

/// Enabled state of the trigger and cancel actions for one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ControlGates {
    pub trigger_enabled: bool,
    pub cancel_enabled: bool,
}

impl ControlGates {
    /// Nothing in flight: the trigger is available, cancel is not.
    pub fn idle() -> Self {
        Self {
            trigger_enabled: true,
            cancel_enabled: false,
        }
    }

    /// A create command is awaiting its id.
    pub fn dispatching() -> Self {
        Self {
            trigger_enabled: false,
            cancel_enabled: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
