// Detection event entity
// One captured-and-classified grocery photo result

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::utils::sanitize_count;
use crate::value_objects::{DetectionId, InventoryKey};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroceryObservation {
    pub item_name: String,
    pub item_count: u32,
    pub storage_location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
}

impl GroceryObservation {
    /// Normalizes one loosely shaped grocery entry from a client payload.
    ///
    /// Unknown fields are ignored and missing ones become empty, so the
    /// aggregation key check is the single place that decides whether the
    /// observation counts.
    pub fn from_value(value: &Value) -> Self {
        let text = |field: &str| {
            value
                .get(field)
                .and_then(Value::as_str)
                .map(|s| s.trim().to_string())
                .unwrap_or_default()
        };
        let emoji = text("emoji");
        Self {
            item_name: text("item_name"),
            item_count: value.get("item_count").map(sanitize_count).unwrap_or(0),
            storage_location: text("storage_location"),
            emoji: if emoji.is_empty() { None } else { Some(emoji) },
        }
    }

    /// Key used for aggregation; `None` means the observation is noise.
    pub fn inventory_key(&self) -> Option<InventoryKey> {
        if self.item_count == 0 {
            return None;
        }
        InventoryKey::new(&self.item_name, &self.storage_location)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionEvent {
    pub id: DetectionId,
    pub captured_date: DateTime<Utc>,
    pub groceries: Vec<GroceryObservation>,
    pub created_at: DateTime<Utc>,
}

impl DetectionEvent {
    pub fn new(captured_date: DateTime<Utc>, groceries: Vec<GroceryObservation>) -> Self {
        Self {
            id: DetectionId::generate(),
            captured_date,
            groceries,
            created_at: Utc::now(),
        }
    }
}

/// Body of `POST /api/detections`. Fields stay untyped until validation so
/// malformed input can be reported with a precise message.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordDetectionPayload {
    #[serde(default)]
    pub captured_date: Option<Value>,
    #[serde(default)]
    pub groceries: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionOrder {
    /// Most recent capture first; used for listings.
    CapturedDesc,
    /// Oldest insert first; used to replay history.
    InsertionAsc,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionView {
    #[default]
    Inventory,
    Events,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DetectionListQuery {
    #[serde(default)]
    pub view: Option<DetectionView>,
}
