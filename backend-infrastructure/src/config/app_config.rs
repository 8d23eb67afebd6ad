use std::env;
use std::path::Path;

use anyhow::{anyhow, Result};
use serde::Deserialize;
use tokio::fs;

use backend_domain::{DbConfig, RuntimeConfig};

use super::validation::validate_identifier;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    ClickHouse,
    Memory,
}

impl StorageBackend {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "clickhouse" => Some(StorageBackend::ClickHouse),
            "memory" => Some(StorageBackend::Memory),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    pub bind_addr: String,
    pub api_token: Option<String>,
    pub storage_backend: String,
    pub database_url: String,
    pub database_name: String,
    pub database_user: Option<String>,
    pub database_password: Option<String>,
    pub detections_collection: String,
    pub inventory_collection: String,
    pub max_body_bytes: u64,
    pub request_timeout_seconds: u64,
    pub log_dir: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3001".to_string(),
            api_token: None,
            storage_backend: "clickhouse".to_string(),
            database_url: "http://127.0.0.1:8123".to_string(),
            database_name: "larder".to_string(),
            database_user: None,
            database_password: None,
            detections_collection: "detections".to_string(),
            inventory_collection: "inventory".to_string(),
            max_body_bytes: 8 * 1024 * 1024,
            request_timeout_seconds: 15,
            log_dir: None,
        }
    }
}

/// Where `AppConfig::load` found its settings. Loading runs before the
/// subscriber exists, so the caller logs this once tracing is up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(String),
    Defaults { missing: String },
}

impl AppConfig {
    /// Loads from `LARDER_CONFIG` (default `./config.toml`), then applies
    /// `LARDER_*` overrides.
    pub async fn load() -> Result<(Self, ConfigSource)> {
        let path = env::var("LARDER_CONFIG").unwrap_or_else(|_| "./config.toml".to_string());
        Self::load_from(&path).await
    }

    pub async fn load_from(path: &str) -> Result<(Self, ConfigSource)> {
        let file_path = Path::new(path);
        let base_dir = file_path.parent();
        let (mut config, source) = if file_path.exists() {
            let content = fs::read_to_string(file_path).await?;
            (Self::from_toml(&content)?, ConfigSource::File(path.to_string()))
        } else {
            (
                AppConfig::default(),
                ConfigSource::Defaults {
                    missing: path.to_string(),
                },
            )
        };
        config.apply_env_overrides();
        config.resolve_paths(base_dir);
        config.normalize();
        config.validate()?;
        Ok((config, source))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn normalize(&mut self) {
        self.api_token = non_blank(self.api_token.take());
        self.database_user = non_blank(self.database_user.take());
        self.database_password = non_blank(self.database_password.take());
        self.log_dir = non_blank(self.log_dir.take());
        self.storage_backend = self.storage_backend.trim().to_lowercase();
        self.database_name = self.database_name.trim().to_string();
        self.detections_collection = self.detections_collection.trim().to_string();
        self.inventory_collection = self.inventory_collection.trim().to_string();
    }

    fn resolve_paths(&mut self, base_dir: Option<&Path>) {
        let Some(base) = base_dir else {
            return;
        };
        if let Some(log_dir) = &self.log_dir {
            self.log_dir = Some(resolve_path(base, log_dir));
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.bind_addr
            .parse::<std::net::SocketAddr>()
            .map_err(|err| anyhow!("invalid bind_addr: {}", err))?;
        if self.max_body_bytes == 0 {
            return Err(anyhow!("max_body_bytes must be greater than 0"));
        }
        if self.request_timeout_seconds == 0 {
            return Err(anyhow!("request_timeout_seconds must be greater than 0"));
        }
        if StorageBackend::parse(&self.storage_backend).is_none() {
            return Err(anyhow!(
                "unknown storage_backend '{}', expected 'clickhouse' or 'memory'",
                self.storage_backend
            ));
        }
        if self.database_url.trim().is_empty() {
            return Err(anyhow!("database_url must not be empty"));
        }
        validate_identifier("database_name", &self.database_name)?;
        validate_identifier("detections_collection", &self.detections_collection)?;
        validate_identifier("inventory_collection", &self.inventory_collection)?;
        if self.detections_collection == self.inventory_collection {
            return Err(anyhow!(
                "detections_collection and inventory_collection must differ"
            ));
        }
        Ok(())
    }

    pub fn storage(&self) -> StorageBackend {
        StorageBackend::parse(&self.storage_backend).unwrap_or(StorageBackend::ClickHouse)
    }

    pub fn to_runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            bind_addr: self.bind_addr.clone(),
            api_token: self.api_token.clone(),
            max_body_bytes: self.max_body_bytes,
            request_timeout_seconds: self.request_timeout_seconds,
        }
    }

    pub fn to_db_config(&self) -> DbConfig {
        DbConfig {
            database_url: self.database_url.clone(),
            database_name: self.database_name.clone(),
            database_user: self.database_user.clone(),
            database_password: self.database_password.clone(),
            detections_collection: self.detections_collection.clone(),
            inventory_collection: self.inventory_collection.clone(),
        }
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| env::var(name).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(value) = lookup("LARDER_BIND_ADDR") {
            self.bind_addr = value;
        }
        if let Some(value) = lookup("LARDER_API_TOKEN") {
            self.api_token = Some(value);
        }
        if let Some(value) = lookup("LARDER_STORAGE_BACKEND") {
            self.storage_backend = value;
        }
        if let Some(value) = lookup("LARDER_DATABASE_URL") {
            self.database_url = value;
        }
        if let Some(value) = lookup("LARDER_DATABASE_NAME") {
            self.database_name = value;
        }
        if let Some(value) = lookup("LARDER_DATABASE_USER") {
            self.database_user = Some(value);
        }
        if let Some(value) = lookup("LARDER_DATABASE_PASSWORD") {
            self.database_password = Some(value);
        }
        if let Some(value) = lookup("LARDER_DETECTIONS_COLLECTION") {
            self.detections_collection = value;
        }
        if let Some(value) = lookup("LARDER_INVENTORY_COLLECTION") {
            self.inventory_collection = value;
        }
        if let Some(value) = lookup("LARDER_MAX_BODY_BYTES") {
            self.max_body_bytes = value.parse().unwrap_or(self.max_body_bytes);
        }
        if let Some(value) = lookup("LARDER_REQUEST_TIMEOUT_SECONDS") {
            self.request_timeout_seconds = value.parse().unwrap_or(self.request_timeout_seconds);
        }
        if let Some(value) = lookup("LARDER_LOG_DIR") {
            self.log_dir = Some(value);
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn resolve_path(base: &Path, value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return trimmed.to_string();
    }
    let path = Path::new(trimmed);
    if path.is_absolute() {
        trimmed.to_string()
    } else {
        base.join(path).to_string_lossy().to_string()
    }
}
