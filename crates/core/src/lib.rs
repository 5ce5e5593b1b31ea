//! Domain model for the studio console.
//!
//! Everything in this crate is pure: operation records and the rules for
//! merging polled snapshots into them, the beat sequence editing model,
//! asset tag/hotspot collections, gallery grouping, and the validation
//! helpers used before a command is dispatched. Callers own all I/O.

pub mod assets;
pub mod beats;
pub mod downloads;
pub mod error;
pub mod gallery;
pub mod generation;
pub mod operation;
pub mod types;
