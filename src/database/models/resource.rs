use chrono::{DateTime, Utc};
use serde::Serialize;

/// 资源版本
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct ResourceVersion {
    pub version_id: String,
    pub resource_id: String,
    pub version_number: String,
    pub download_url: String,
    pub download_count: i64,
    pub created_at: DateTime<Utc>,
}
