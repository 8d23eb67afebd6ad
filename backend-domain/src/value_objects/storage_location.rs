// Storage location value object

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageLocation {
    Fridge,
    Pantry,
    Other(String),
}

impl StorageLocation {
    pub fn is_known(&self) -> bool {
        !matches!(self, StorageLocation::Other(_))
    }
}

impl From<&str> for StorageLocation {
    fn from(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "fridge" => StorageLocation::Fridge,
            "pantry" => StorageLocation::Pantry,
            _ => StorageLocation::Other(s.trim().to_string()),
        }
    }
}
