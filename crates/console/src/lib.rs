//! Control layer of the studio console.
//!
//! [`ConsoleSession`] is the single-owner controller behind the UI: it
//! dispatches create commands, hands returned ids to the tracker
//! registry, and owns the beat and asset editors and the last gallery.

pub mod asset_editor;
pub mod beat_editor;
pub mod config;
pub mod error;
pub mod session;

pub use asset_editor::AssetEditor;
pub use beat_editor::BeatEditor;
pub use config::ConsoleConfig;
pub use error::ConsoleError;
pub use session::ConsoleSession;
