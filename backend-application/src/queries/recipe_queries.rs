use serde_json::Value;

use crate::AppError;

pub fn rank_recipes(recipes: Value) -> Result<Vec<Value>, AppError> {
    backend_domain::rank_recipes(recipes).map_err(|err| AppError::BadRequest(err.to_string()))
}
