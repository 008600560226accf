use chrono::{DateTime, Utc};
use serde::Serialize;

/// 展示帖
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct ShowcasePost {
    pub post_id: String,
    pub author_id: String,
    pub title: String,
    pub content: String,
    pub status: String,
    pub view_count: i64,
    pub created_at: DateTime<Utc>,
}

impl ShowcasePost {
    pub fn is_published(&self) -> bool {
        self.status == "PUBLISHED"
    }
}
