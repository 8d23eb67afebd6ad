use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info};

use crate::commands::inventory_commands::apply_observations_locked;
use crate::queries::inventory_queries::list_inventory;
use crate::{AppError, AppState};
use backend_domain::{
    next_insertion_stamp, parse_timestamp, ApplySign, DetectionEvent, DetectionId,
    GroceryObservation, InventoryLine, RecordDetectionPayload, StorageLocation,
};

#[derive(Debug, Clone, Serialize)]
pub struct RecordedDetection {
    pub detection: DetectionEvent,
    pub inventory: Vec<InventoryLine>,
}

pub fn validate_payload(
    payload: RecordDetectionPayload,
) -> Result<(DateTime<Utc>, Vec<GroceryObservation>), AppError> {
    let captured_date = match payload.captured_date {
        None | Some(Value::Null) => {
            return Err(AppError::BadRequest("captured_date is required".to_string()))
        }
        Some(value) => parse_timestamp(&value)
            .map_err(|err| AppError::BadRequest(format!("invalid captured_date: {}", err)))?,
    };
    let groceries = match payload.groceries {
        Some(Value::Array(items)) => items
            .iter()
            .map(GroceryObservation::from_value)
            .collect::<Vec<_>>(),
        _ => return Err(AppError::BadRequest("groceries must be an array".to_string())),
    };
    Ok((captured_date, groceries))
}

pub async fn record_detection(
    state: &AppState,
    payload: RecordDetectionPayload,
) -> Result<RecordedDetection, AppError> {
    let (captured_date, groceries) = validate_payload(payload)?;
    for observation in &groceries {
        let location = StorageLocation::from(observation.storage_location.as_str());
        if !location.is_known() && !observation.storage_location.is_empty() {
            debug!(
                location = %observation.storage_location,
                "unrecognized storage location"
            );
        }
    }

    let mut last_stamp = state.inventory_lock.lock().await;
    let mut detection = DetectionEvent::new(captured_date, groceries);
    detection.created_at = next_insertion_stamp(*last_stamp, Utc::now());
    if let Err(err) = state.detection_repo.insert_detection(&detection).await {
        error!("failed to insert detection: {}", err);
        state.metrics.record_storage_error();
        return Err(AppError::Internal(err));
    }
    *last_stamp = Some(detection.created_at);
    state.metrics.record_detection();
    info!(
        id = %detection.id,
        groceries = detection.groceries.len(),
        "detection recorded"
    );

    // The detection is already stored; a failed aggregate update leaves the
    // inventory stale rather than failing the request.
    if let Err(err) =
        apply_observations_locked(state, &detection.groceries, ApplySign::Add).await
    {
        error!(id = %detection.id, "inventory update after insert failed: {}", err);
    }
    drop(last_stamp);

    let inventory = list_inventory(state).await?;
    Ok(RecordedDetection {
        detection,
        inventory,
    })
}

pub async fn remove_detection(
    state: &AppState,
    id: &str,
) -> Result<Vec<InventoryLine>, AppError> {
    let id = DetectionId::from(id);
    if id.as_str().is_empty() {
        return Err(AppError::BadRequest("detection id must not be empty".to_string()));
    }

    let guard = state.inventory_lock.lock().await;
    let detection = state
        .detection_repo
        .find_detection(&id)
        .await
        .map_err(|err| {
            error!("failed to look up detection {}: {}", id, err);
            state.metrics.record_storage_error();
            AppError::Internal(err)
        })?
        .ok_or_else(|| AppError::NotFound(format!("detection '{}'", id)))?;

    let deleted = state
        .detection_repo
        .delete_detection(&id)
        .await
        .map_err(|err| {
            error!("failed to delete detection {}: {}", id, err);
            state.metrics.record_storage_error();
            AppError::Internal(err)
        })?;
    if !deleted {
        return Err(AppError::NotFound(format!("detection '{}'", id)));
    }
    state.metrics.record_removal();
    info!(id = %id, "detection removed");

    if let Err(err) =
        apply_observations_locked(state, &detection.groceries, ApplySign::Subtract).await
    {
        error!(id = %id, "inventory reversal failed: {}", err);
    }
    drop(guard);

    list_inventory(state).await
}
