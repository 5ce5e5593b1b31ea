use studio_client::ApiError;
use studio_core::error::CoreError;

/// Errors surfaced by console commands.
#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    /// A backend call failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// A local edit was rejected.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A request failed field validation before dispatch.
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("No project is open")]
    NoProjectOpen,

    #[error("No generation job is being tracked")]
    NoActiveJob,

    #[error("Asset not open: {0}")]
    AssetNotOpen(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl From<validator::ValidationErrors> for ConsoleError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ConsoleError::Validation(errors.to_string())
    }
}
