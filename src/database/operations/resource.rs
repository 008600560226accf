use sqlx::PgPool;

use crate::database::models::resource::ResourceVersion;

/// 按ID查询资源版本
pub async fn find_version_by_id(
    pool: &PgPool,
    version_id: &str,
) -> Result<Option<ResourceVersion>, sqlx::Error> {
    sqlx::query_as::<_, ResourceVersion>(
        r#"
        SELECT version_id, resource_id, version_number, download_url, download_count, created_at
        FROM resource_versions
        WHERE version_id = $1
        "#,
    )
    .bind(version_id)
    .fetch_optional(pool)
    .await
}

/// 同时自增版本和所属资源的下载计数
pub async fn increment_download_counts(
    pool: &PgPool,
    version_id: &str,
    resource_id: &str,
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query("UPDATE resource_versions SET download_count = download_count + 1 WHERE version_id = $1")
        .bind(version_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("UPDATE resources SET download_count = download_count + 1 WHERE resource_id = $1")
        .bind(resource_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(())
}
