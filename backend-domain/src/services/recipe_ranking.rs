use anyhow::{anyhow, Result};
use serde_json::Value;

/// Reads `recipe.nutrition.score`, treating anything missing or non-numeric
/// as zero.
pub fn nutrition_score(recipe: &Value) -> f64 {
    let score = recipe.get("nutrition").and_then(|nutrition| nutrition.get("score"));
    let parsed = match score {
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(text)) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|value| value.is_finite()).unwrap_or(0.0)
}

/// Orders recipes by nutrition score, best first. Equal scores keep their
/// input order.
pub fn rank_recipes(recipes: Value) -> Result<Vec<Value>> {
    let Value::Array(mut list) = recipes else {
        return Err(anyhow!("Expected a list of recipes"));
    };
    list.sort_by(|a, b| nutrition_score(b).total_cmp(&nutrition_score(a)));
    Ok(list)
}
