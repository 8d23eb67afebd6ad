use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::Serialize;
use serde_json::Value;

use backend_application::queries::recipe_queries;
use backend_application::AppState;

use crate::error::HttpError;
use crate::middleware::{authorize, parse_json_body};

#[derive(Serialize)]
pub struct RankedRecipes {
    pub recipes: Vec<Value>,
}

/// Accepts either a bare recipe array or `{ "recipes": [...] }`.
pub async fn rank_recipes(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<RankedRecipes>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let value: Value = parse_json_body(&headers, &body)
        .map_err(|err| HttpError::BadRequest(format!("invalid request body: {}", err)))?;
    let recipes = match value {
        Value::Object(mut map) if map.contains_key("recipes") => {
            map.remove("recipes").unwrap_or(Value::Null)
        }
        other => other,
    };
    let recipes = recipe_queries::rank_recipes(recipes)?;
    Ok(Json(RankedRecipes { recipes }))
}
