use anyhow::Result;
use async_trait::async_trait;
use clickhouse::{Client, Row};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::{info, warn};

use backend_domain::{
    DbConfig, DetectionEvent, DetectionId, DetectionOrder, DetectionRepository, GroceryObservation,
    InventoryKey, InventoryLine, InventoryRepository, StorageLifecycle,
};

use crate::utils::{from_offset, to_offset};

#[derive(Debug, Clone, Serialize, Deserialize, Row)]
struct DetectionRow {
    id: String,
    #[serde(with = "clickhouse::serde::time::datetime64::millis")]
    captured_date: OffsetDateTime,
    #[serde(with = "clickhouse::serde::time::datetime64::millis")]
    created_at: OffsetDateTime,
    groceries_json: String,
}

impl DetectionRow {
    fn from_event(event: &DetectionEvent) -> Result<Self> {
        Ok(Self {
            id: event.id.0.clone(),
            captured_date: to_offset(&event.captured_date),
            created_at: to_offset(&event.created_at),
            groceries_json: serde_json::to_string(&event.groceries)?,
        })
    }

    fn into_event(self) -> DetectionEvent {
        let groceries = serde_json::from_str::<Vec<GroceryObservation>>(&self.groceries_json)
            .unwrap_or_else(|err| {
                warn!("detection {} has unreadable groceries: {}", self.id, err);
                Vec::new()
            });
        DetectionEvent {
            id: DetectionId(self.id),
            captured_date: from_offset(self.captured_date),
            groceries,
            created_at: from_offset(self.created_at),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Row)]
struct InventoryRow {
    key: String,
    item_name: String,
    storage_location: String,
    item_count: i64,
    emoji: String,
    #[serde(with = "clickhouse::serde::time::datetime64::millis")]
    created_at: OffsetDateTime,
    #[serde(with = "clickhouse::serde::time::datetime64::millis")]
    updated_at: OffsetDateTime,
}

impl InventoryRow {
    fn from_line(line: &InventoryLine) -> Option<Self> {
        let key = line.key()?;
        Some(Self {
            key: key.as_str().to_string(),
            item_name: line.item_name.clone(),
            storage_location: line.storage_location.clone(),
            item_count: line.item_count,
            emoji: line.emoji.clone(),
            created_at: to_offset(&line.created_at),
            updated_at: to_offset(&line.updated_at),
        })
    }

    fn into_line(self) -> InventoryLine {
        InventoryLine {
            item_name: self.item_name,
            storage_location: self.storage_location,
            item_count: self.item_count,
            emoji: self.emoji,
            created_at: from_offset(self.created_at),
            updated_at: from_offset(self.updated_at),
        }
    }
}

const DETECTION_COLUMNS: &str = "id, captured_date, created_at, groceries_json";
const INVENTORY_COLUMNS: &str =
    "key, item_name, storage_location, item_count, emoji, created_at, updated_at";

/// ClickHouse-backed detection and inventory storage.
///
/// Inventory lives in a `ReplacingMergeTree` keyed by the aggregation key, so
/// an upsert is a plain insert and reads go through `FINAL`.
#[derive(Clone)]
pub struct ClickhouseRepo {
    client: Client,
    database: String,
    detections_table: String,
    inventory_table: String,
}

impl ClickhouseRepo {
    pub fn new(client: Client, config: &DbConfig) -> Self {
        Self {
            client,
            database: config.database_name.clone(),
            detections_table: config.detections_collection.clone(),
            inventory_table: config.inventory_collection.clone(),
        }
    }

    pub fn connect(config: &DbConfig) -> Self {
        let mut client = Client::default()
            .with_url(&config.database_url)
            .with_database(&config.database_name);
        if let Some(user) = &config.database_user {
            client = client.with_user(user);
        }
        if let Some(password) = &config.database_password {
            client = client.with_password(password);
        }
        Self::new(client, config)
    }
}

#[async_trait]
impl StorageLifecycle for ClickhouseRepo {
    async fn ensure_schema(&self) -> Result<()> {
        let create_db = format!("CREATE DATABASE IF NOT EXISTS {}", self.database);
        self.client.query(&create_db).execute().await?;

        let create_detections = format!(
            r#"
CREATE TABLE IF NOT EXISTS {} (
    id String,
    captured_date DateTime64(3),
    created_at DateTime64(3),
    groceries_json String
) ENGINE = MergeTree
ORDER BY (created_at, id)
"#,
            self.detections_table
        );
        self.client.query(&create_detections).execute().await?;

        let create_inventory = format!(
            r#"
CREATE TABLE IF NOT EXISTS {} (
    key String,
    item_name String,
    storage_location String,
    item_count Int64,
    emoji String,
    created_at DateTime64(3),
    updated_at DateTime64(3)
) ENGINE = ReplacingMergeTree(updated_at)
ORDER BY key
"#,
            self.inventory_table
        );
        self.client.query(&create_inventory).execute().await?;
        info!(
            database = %self.database,
            detections = %self.detections_table,
            inventory = %self.inventory_table,
            "clickhouse schema ready"
        );
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        let _: u8 = self.client.query("SELECT toUInt8(1)").fetch_one().await?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        // The HTTP client holds no server-side session; dropping it is enough.
        info!(database = %self.database, "clickhouse storage closed");
        Ok(())
    }
}

#[async_trait]
impl DetectionRepository for ClickhouseRepo {
    async fn insert_detection(&self, detection: &DetectionEvent) -> Result<()> {
        let row = DetectionRow::from_event(detection)?;
        let mut insert = self.client.insert(&self.detections_table)?;
        insert.write(&row).await?;
        insert.end().await?;
        Ok(())
    }

    async fn find_detection(&self, id: &DetectionId) -> Result<Option<DetectionEvent>> {
        let query = format!(
            "SELECT {} FROM {} WHERE id = ? LIMIT 1",
            DETECTION_COLUMNS, self.detections_table
        );
        let rows = self
            .client
            .query(&query)
            .bind(id.as_str())
            .fetch_all::<DetectionRow>()
            .await?;
        Ok(rows.into_iter().next().map(DetectionRow::into_event))
    }

    async fn delete_detection(&self, id: &DetectionId) -> Result<bool> {
        if self.find_detection(id).await?.is_none() {
            return Ok(false);
        }
        let query = format!("DELETE FROM {} WHERE id = ?", self.detections_table);
        self.client.query(&query).bind(id.as_str()).execute().await?;
        Ok(true)
    }

    async fn list_detections(&self, order: DetectionOrder) -> Result<Vec<DetectionEvent>> {
        let order_by = match order {
            DetectionOrder::CapturedDesc => "captured_date DESC, created_at DESC",
            // created_at is strictly increasing per process; id only breaks
            // ties between writers in different processes.
            DetectionOrder::InsertionAsc => "created_at ASC, id ASC",
        };
        let query = format!(
            "SELECT {} FROM {} ORDER BY {}",
            DETECTION_COLUMNS, self.detections_table, order_by
        );
        let rows = self.client.query(&query).fetch_all::<DetectionRow>().await?;
        Ok(rows.into_iter().map(DetectionRow::into_event).collect())
    }
}

#[async_trait]
impl InventoryRepository for ClickhouseRepo {
    async fn fetch_lines(&self, keys: &[InventoryKey]) -> Result<Vec<InventoryLine>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let keys = keys
            .iter()
            .map(|key| key.as_str().to_string())
            .collect::<Vec<_>>();
        let query = format!(
            "SELECT {} FROM {} FINAL WHERE has(?, key)",
            INVENTORY_COLUMNS, self.inventory_table
        );
        let rows = self
            .client
            .query(&query)
            .bind(keys)
            .fetch_all::<InventoryRow>()
            .await?;
        Ok(rows.into_iter().map(InventoryRow::into_line).collect())
    }

    async fn fetch_all_lines(&self) -> Result<Vec<InventoryLine>> {
        let query = format!(
            "SELECT {} FROM {} FINAL WHERE item_count > 0",
            INVENTORY_COLUMNS, self.inventory_table
        );
        let rows = self.client.query(&query).fetch_all::<InventoryRow>().await?;
        Ok(rows.into_iter().map(InventoryRow::into_line).collect())
    }

    async fn upsert_lines(&self, lines: &[InventoryLine]) -> Result<()> {
        let rows = lines
            .iter()
            .filter_map(InventoryRow::from_line)
            .collect::<Vec<_>>();
        if rows.is_empty() {
            return Ok(());
        }
        let mut insert = self.client.insert(&self.inventory_table)?;
        for row in &rows {
            insert.write(row).await?;
        }
        insert.end().await?;
        Ok(())
    }

    async fn remove_lines(&self, keys: &[InventoryKey]) -> Result<()> {
        if keys.is_empty() {
            return Ok(());
        }
        let keys = keys
            .iter()
            .map(|key| key.as_str().to_string())
            .collect::<Vec<_>>();
        let query = format!("DELETE FROM {} WHERE has(?, key)", self.inventory_table);
        self.client.query(&query).bind(keys).execute().await?;
        Ok(())
    }
}
