use axum::routing::{delete, get, post};
use axum::Router;

use backend_application::AppState;

use crate::handlers::{detection_handlers, ops_handlers, recipe_handlers};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/detections",
            get(detection_handlers::list_detections).post(detection_handlers::record_detection),
        )
        .route(
            "/api/detections/:id",
            delete(detection_handlers::remove_detection),
        )
        .route("/api/inventory", get(detection_handlers::list_inventory))
        .route("/api/recipes/rank", post(recipe_handlers::rank_recipes))
        .route("/api/ops/health/live", get(ops_handlers::health_live))
        .route("/api/ops/health/ready", get(ops_handlers::health_ready))
        .route(
            "/api/ops/metrics/prometheus",
            get(ops_handlers::metrics_prometheus),
        )
        .with_state(state)
}
