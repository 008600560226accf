use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::database::models::showcase::ShowcasePost;

#[derive(Debug, Serialize)]
pub struct ShowcasePostResponse {
    pub post_id: String,
    pub author_id: String,
    pub title: String,
    pub content: String,
    pub view_count: i64,
    pub created_at: DateTime<Utc>,
}

impl From<ShowcasePost> for ShowcasePostResponse {
    fn from(post: ShowcasePost) -> Self {
        Self {
            post_id: post.post_id,
            author_id: post.author_id,
            title: post.title,
            content: post.content,
            view_count: post.view_count,
            created_at: post.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct CreatePostResponse {
    pub post_id: String,
}
