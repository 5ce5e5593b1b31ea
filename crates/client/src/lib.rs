//! REST client for the studio backend.
//!
//! Provides typed request/response messages, the [`api::StudioApi`]
//! HTTP client built on [`reqwest`], error-body interpretation, and the
//! backend traits that the tracker and console layers depend on.

pub mod api;
pub mod backend;
pub mod error;
pub mod messages;

pub use api::StudioApi;
pub use backend::{ArtifactBackend, CatalogBackend, OperationBackend};
pub use error::ApiError;
