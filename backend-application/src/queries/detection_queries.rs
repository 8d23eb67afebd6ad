use tracing::error;

use crate::{AppError, AppState};
use backend_domain::{DetectionEvent, DetectionOrder};

pub async fn list_detections(state: &AppState) -> Result<Vec<DetectionEvent>, AppError> {
    state
        .detection_repo
        .list_detections(DetectionOrder::CapturedDesc)
        .await
        .map_err(|err| {
            error!("failed to fetch detections: {}", err);
            state.metrics.record_storage_error();
            AppError::Internal(err)
        })
}
