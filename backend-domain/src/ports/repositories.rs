use async_trait::async_trait;

use crate::entities::{DetectionEvent, DetectionOrder, InventoryLine};
use crate::value_objects::{DetectionId, InventoryKey};

#[async_trait]
pub trait DetectionRepository: Send + Sync {
    async fn insert_detection(&self, detection: &DetectionEvent) -> anyhow::Result<()>;
    async fn find_detection(&self, id: &DetectionId) -> anyhow::Result<Option<DetectionEvent>>;
    /// Returns `false` when nothing matched `id`.
    async fn delete_detection(&self, id: &DetectionId) -> anyhow::Result<bool>;
    async fn list_detections(&self, order: DetectionOrder) -> anyhow::Result<Vec<DetectionEvent>>;
}

#[async_trait]
pub trait InventoryRepository: Send + Sync {
    async fn fetch_lines(&self, keys: &[InventoryKey]) -> anyhow::Result<Vec<InventoryLine>>;
    async fn fetch_all_lines(&self) -> anyhow::Result<Vec<InventoryLine>>;
    async fn upsert_lines(&self, lines: &[InventoryLine]) -> anyhow::Result<()>;
    async fn remove_lines(&self, keys: &[InventoryKey]) -> anyhow::Result<()>;
}

#[async_trait]
pub trait StorageLifecycle: Send + Sync {
    async fn ensure_schema(&self) -> anyhow::Result<()>;
    async fn ping(&self) -> anyhow::Result<()>;
    async fn close(&self) -> anyhow::Result<()>;
}
