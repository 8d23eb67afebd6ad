use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use backend_application::AppState;
use backend_domain::StorageLifecycle;
use backend_infrastructure::{AppConfig, ClickhouseRepo, MemoryRepository, StorageBackend};

pub struct AppContext {
    pub state: AppState,
}

impl AppContext {
    pub async fn new(config: &AppConfig) -> Result<Self> {
        let runtime_config = config.to_runtime_config();

        let state = match config.storage() {
            StorageBackend::ClickHouse => {
                let db_config = config.to_db_config();
                let repo = Arc::new(ClickhouseRepo::connect(&db_config));
                repo.ensure_schema().await?;
                repo.ping().await?;
                info!(
                    url = %db_config.database_url,
                    database = %db_config.database_name,
                    "using clickhouse storage"
                );
                AppState::new(runtime_config, repo.clone(), repo.clone(), repo)
            }
            StorageBackend::Memory => {
                let repo = Arc::new(MemoryRepository::new());
                info!("using in-memory storage, data is lost on exit");
                AppState::new(runtime_config, repo.clone(), repo.clone(), repo)
            }
        };

        Ok(Self { state })
    }
}
