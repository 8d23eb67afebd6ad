use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Serialize;
use tracing::warn;

use backend_application::commands::detection_commands::{self, RecordedDetection};
use backend_application::queries::{detection_queries, inventory_queries};
use backend_application::AppState;
use backend_domain::{
    DetectionEvent, DetectionListQuery, DetectionView, InventoryLine, RecordDetectionPayload,
};

use crate::error::HttpError;
use crate::middleware::{authorize, parse_json_body};

#[derive(Serialize)]
pub struct InventoryResponse {
    pub inventory: Vec<InventoryLine>,
}

#[derive(Serialize)]
pub struct DetectionsResponse {
    pub detections: Vec<DetectionEvent>,
}

#[derive(Serialize)]
#[serde(untagged)]
pub enum DetectionListing {
    Inventory(InventoryResponse),
    Events(DetectionsResponse),
}

pub async fn list_detections(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<DetectionListQuery>,
) -> Result<Json<DetectionListing>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let listing = match query.view.unwrap_or_default() {
        DetectionView::Inventory => DetectionListing::Inventory(InventoryResponse {
            inventory: inventory_queries::list_inventory(&state).await?,
        }),
        DetectionView::Events => DetectionListing::Events(DetectionsResponse {
            detections: detection_queries::list_detections(&state).await?,
        }),
    };
    Ok(Json(listing))
}

pub async fn list_inventory(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<InventoryResponse>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let inventory = inventory_queries::list_inventory(&state).await?;
    Ok(Json(InventoryResponse { inventory }))
}

pub async fn record_detection(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<RecordedDetection>), HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let payload: RecordDetectionPayload = parse_json_body(&headers, &body).map_err(|err| {
        warn!("failed to parse detection body: {}", err);
        HttpError::BadRequest(format!("invalid request body: {}", err))
    })?;
    let recorded = detection_commands::record_detection(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(recorded)))
}

pub async fn remove_detection(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<InventoryResponse>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let inventory = detection_commands::remove_detection(&state, &id).await?;
    Ok(Json(InventoryResponse { inventory }))
}
