// Inventory line entity
// Materialized running total for one (item, location) pair

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::InventoryKey;

pub const DEFAULT_EMOJI: &str = "🛒";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryLine {
    pub item_name: String,
    pub storage_location: String,
    pub item_count: i64,
    pub emoji: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InventoryLine {
    pub fn key(&self) -> Option<InventoryKey> {
        InventoryKey::new(&self.item_name, &self.storage_location)
    }
}

/// Writes a reconcile step wants applied to storage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InventoryChanges {
    pub upserts: Vec<InventoryLine>,
    pub removals: Vec<InventoryKey>,
    /// Reversals that found no line to subtract from.
    pub skipped: Vec<InventoryKey>,
}

impl InventoryChanges {
    pub fn is_empty(&self) -> bool {
        self.upserts.is_empty() && self.removals.is_empty()
    }
}
