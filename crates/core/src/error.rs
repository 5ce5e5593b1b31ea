#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Index {index} out of range for {len} items")]
    OutOfRange { index: usize, len: usize },

    #[error("Validation failed: {0}")]
    Validation(String),
}
