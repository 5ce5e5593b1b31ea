//! One status fetch, routed to the endpoint family of the kind.

use studio_client::{ApiError, OperationBackend};
use studio_core::operation::{OperationKind, OperationSnapshot};

/// Fetch the current status of `id` and normalize it into a snapshot.
pub async fn fetch_snapshot(
    backend: &dyn OperationBackend,
    kind: OperationKind,
    id: &str,
) -> Result<OperationSnapshot, ApiError> {
    match kind {
        OperationKind::GenerationJob => backend.job_status(id).await.map(Into::into),
        OperationKind::ModelDownload => backend.download_status(id).await.map(Into::into),
    }
}
