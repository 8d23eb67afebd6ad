use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use backend_domain::{GroceryObservation, InventoryKey, InventoryLine, InventoryRepository, RuntimeConfig};
use backend_infrastructure::MemoryRepository;

use crate::AppState;

pub fn obs(name: &str, count: u32, location: &str) -> GroceryObservation {
    GroceryObservation {
        item_name: name.to_string(),
        item_count: count,
        storage_location: location.to_string(),
        emoji: None,
    }
}

pub fn runtime_config() -> RuntimeConfig {
    RuntimeConfig {
        bind_addr: "127.0.0.1:0".to_string(),
        api_token: None,
        max_body_bytes: 1024,
        request_timeout_seconds: 5,
    }
}

pub fn memory_state() -> (AppState, Arc<MemoryRepository>) {
    let repo = Arc::new(MemoryRepository::new());
    let state = AppState::new(runtime_config(), repo.clone(), repo.clone(), repo.clone());
    (state, repo)
}

/// Rejects multi-line writes and, optionally, writes for one poisoned key.
pub struct FlakyInventory {
    pub inner: MemoryRepository,
    pub poisoned: Option<InventoryKey>,
    pub reject_bulk: AtomicBool,
}

#[async_trait]
impl InventoryRepository for FlakyInventory {
    async fn fetch_lines(&self, keys: &[InventoryKey]) -> anyhow::Result<Vec<InventoryLine>> {
        self.inner.fetch_lines(keys).await
    }

    async fn fetch_all_lines(&self) -> anyhow::Result<Vec<InventoryLine>> {
        self.inner.fetch_all_lines().await
    }

    async fn upsert_lines(&self, lines: &[InventoryLine]) -> anyhow::Result<()> {
        if lines.len() > 1 && self.reject_bulk.load(Ordering::SeqCst) {
            anyhow::bail!("bulk write rejected");
        }
        if lines.iter().any(|line| line.key() == self.poisoned) {
            anyhow::bail!("poisoned line");
        }
        self.inner.upsert_lines(lines).await
    }

    async fn remove_lines(&self, keys: &[InventoryKey]) -> anyhow::Result<()> {
        self.inner.remove_lines(keys).await
    }
}
