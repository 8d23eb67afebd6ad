use std::sync::Arc;

use backend_domain::ports::{DetectionRepository, InventoryRepository, StorageLifecycle};
use backend_domain::RuntimeConfig;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::Metrics;

#[derive(Clone)]
pub struct AppState {
    pub config: RuntimeConfig,
    pub detection_repo: Arc<dyn DetectionRepository>,
    pub inventory_repo: Arc<dyn InventoryRepository>,
    pub storage: Arc<dyn StorageLifecycle>,
    /// Serializes detection writes together with their inventory update, and
    /// the lazy rebuild. Holds the last `created_at` handed to a detection.
    pub inventory_lock: Arc<Mutex<Option<DateTime<Utc>>>>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(
        config: RuntimeConfig,
        detection_repo: Arc<dyn DetectionRepository>,
        inventory_repo: Arc<dyn InventoryRepository>,
        storage: Arc<dyn StorageLifecycle>,
    ) -> Self {
        Self {
            config,
            detection_repo,
            inventory_repo,
            storage,
            inventory_lock: Arc::new(Mutex::new(None)),
            metrics: Arc::new(Metrics::default()),
        }
    }
}
