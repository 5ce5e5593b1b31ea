//! Polling of long-running backend operations.
//!
//! An [`OperationTracker`] owns one poll loop for one operation id. The
//! [`TrackerRegistry`] keeps at most one tracker per
//! [`OperationKind`](studio_core::operation::OperationKind) and fans
//! lifecycle events out on a broadcast channel.

pub mod config;
pub mod events;
pub mod poll;
pub mod registry;
pub mod tracker;

pub use config::TrackerConfig;
pub use events::{StopReason, TrackerEvent};
pub use registry::TrackerRegistry;
pub use tracker::OperationTracker;
