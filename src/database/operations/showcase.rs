use sqlx::PgPool;

use crate::database::models::showcase::ShowcasePost;

/// 按ID查询展示帖
pub async fn find_post_by_id(
    pool: &PgPool,
    post_id: &str,
) -> Result<Option<ShowcasePost>, sqlx::Error> {
    sqlx::query_as::<_, ShowcasePost>(
        r#"
        SELECT post_id, author_id, title, content, status, view_count, created_at
        FROM showcase_posts
        WHERE post_id = $1
        "#,
    )
    .bind(post_id)
    .fetch_optional(pool)
    .await
}

/// 浏览计数持久化自增
/// 只在去重判定通过后调用，单条UPDATE自身是原子的
pub async fn increment_view_count(pool: &PgPool, post_id: &str) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE showcase_posts SET view_count = view_count + 1 WHERE post_id = $1")
        .bind(post_id)
        .execute(pool)
        .await?;

    Ok(())
}

/// 创建展示帖
pub async fn create_post(
    pool: &PgPool,
    post_id: &str,
    author_id: &str,
    title: &str,
    content: &str,
) -> Result<ShowcasePost, sqlx::Error> {
    sqlx::query_as::<_, ShowcasePost>(
        r#"
        INSERT INTO showcase_posts (post_id, author_id, title, content, status, view_count, created_at)
        VALUES ($1, $2, $3, $4, 'PUBLISHED', 0, NOW())
        RETURNING post_id, author_id, title, content, status, view_count, created_at
        "#,
    )
    .bind(post_id)
    .bind(author_id)
    .bind(title)
    .bind(content)
    .fetch_one(pool)
    .await
}
