use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;

use backend_domain::{
    DetectionEvent, DetectionId, DetectionOrder, DetectionRepository, InventoryKey, InventoryLine,
    InventoryRepository, StorageLifecycle,
};

/// Process-local storage used for `storage_backend = "memory"` and tests.
#[derive(Default)]
pub struct MemoryRepository {
    detections: RwLock<Vec<DetectionEvent>>,
    inventory: RwLock<HashMap<InventoryKey, InventoryLine>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops every materialized line, leaving detection history intact.
    pub async fn clear_inventory(&self) {
        self.inventory.write().await.clear();
    }
}

#[async_trait]
impl DetectionRepository for MemoryRepository {
    async fn insert_detection(&self, detection: &DetectionEvent) -> Result<()> {
        self.detections.write().await.push(detection.clone());
        Ok(())
    }

    async fn find_detection(&self, id: &DetectionId) -> Result<Option<DetectionEvent>> {
        let detections = self.detections.read().await;
        Ok(detections.iter().find(|d| &d.id == id).cloned())
    }

    async fn delete_detection(&self, id: &DetectionId) -> Result<bool> {
        let mut detections = self.detections.write().await;
        let before = detections.len();
        detections.retain(|d| &d.id != id);
        Ok(detections.len() != before)
    }

    async fn list_detections(&self, order: DetectionOrder) -> Result<Vec<DetectionEvent>> {
        let mut detections = self.detections.read().await.clone();
        match order {
            DetectionOrder::CapturedDesc => detections.sort_by(|a, b| {
                b.captured_date
                    .cmp(&a.captured_date)
                    .then_with(|| b.created_at.cmp(&a.created_at))
            }),
            DetectionOrder::InsertionAsc => detections.sort_by(|a, b| {
                a.created_at
                    .cmp(&b.created_at)
                    .then_with(|| a.id.as_str().cmp(b.id.as_str()))
            }),
        }
        Ok(detections)
    }
}

#[async_trait]
impl InventoryRepository for MemoryRepository {
    async fn fetch_lines(&self, keys: &[InventoryKey]) -> Result<Vec<InventoryLine>> {
        let inventory = self.inventory.read().await;
        Ok(keys
            .iter()
            .filter_map(|key| inventory.get(key).cloned())
            .collect())
    }

    async fn fetch_all_lines(&self) -> Result<Vec<InventoryLine>> {
        let inventory = self.inventory.read().await;
        Ok(inventory
            .values()
            .filter(|line| line.item_count > 0)
            .cloned()
            .collect())
    }

    async fn upsert_lines(&self, lines: &[InventoryLine]) -> Result<()> {
        let mut inventory = self.inventory.write().await;
        for line in lines {
            if let Some(key) = line.key() {
                inventory.insert(key, line.clone());
            }
        }
        Ok(())
    }

    async fn remove_lines(&self, keys: &[InventoryKey]) -> Result<()> {
        let mut inventory = self.inventory.write().await;
        for key in keys {
            inventory.remove(key);
        }
        Ok(())
    }
}

#[async_trait]
impl StorageLifecycle for MemoryRepository {
    async fn ensure_schema(&self) -> Result<()> {
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
