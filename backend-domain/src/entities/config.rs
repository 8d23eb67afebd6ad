// Runtime configuration handed from infrastructure to the inner layers

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub bind_addr: String,
    pub api_token: Option<String>,
    pub max_body_bytes: u64,
    pub request_timeout_seconds: u64,
}

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub database_url: String,
    pub database_name: String,
    pub database_user: Option<String>,
    pub database_password: Option<String>,
    pub detections_collection: String,
    pub inventory_collection: String,
}
