// Aggregation key for inventory lines

use std::fmt;

use serde::{Deserialize, Serialize};

/// Case-insensitive `(item_name, storage_location)` key, rendered as
/// `name|location` after trimming and lower-casing both parts.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InventoryKey(String);

impl InventoryKey {
    /// Returns `None` when either part is blank.
    pub fn new(item_name: &str, storage_location: &str) -> Option<Self> {
        let name = item_name.trim();
        let location = storage_location.trim();
        if name.is_empty() || location.is_empty() {
            return None;
        }
        Some(Self(format!(
            "{}|{}",
            name.to_lowercase(),
            location.to_lowercase()
        )))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Wraps an already-normalized key read back from storage.
    pub fn from_stored(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }
}

impl fmt::Display for InventoryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_ignores_case_and_padding() {
        let a = InventoryKey::new("Tomato", "Fridge").expect("key");
        let b = InventoryKey::new("  tomato ", "FRIDGE").expect("key");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "tomato|fridge");
    }

    #[test]
    fn blank_parts_have_no_key() {
        assert!(InventoryKey::new("", "Fridge").is_none());
        assert!(InventoryKey::new("Milk", "   ").is_none());
    }
}
