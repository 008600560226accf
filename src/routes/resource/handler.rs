use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
};

use crate::{
    AppState,
    cache::EventKind,
    database::operations::resource,
    utils::{client_ip, error_codes, error_to_api_response},
};

/// 下载资源版本
/// 同一IP对同一版本每天只计一次下载，判定通过后自增版本与资源的持久化计数，
/// 最终重定向到实际的下载地址
pub async fn download_version(
    State(state): State<AppState>,
    Path(version_id): Path<String>,
    ConnectInfo(remote_addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Response {
    let version = match resource::find_version_by_id(&state.pool, &version_id).await {
        Ok(Some(version)) => version,
        Ok(None) => {
            return (
                StatusCode::OK,
                error_to_api_response::<()>(error_codes::NOT_FOUND, "资源版本不存在".into()),
            )
                .into_response();
        }
        Err(err) => {
            tracing::error!("查询资源版本错误: {:?}", err);
            return (
                StatusCode::OK,
                error_to_api_response::<()>(error_codes::INTERNAL_ERROR, "获取资源版本失败".into()),
            )
                .into_response();
        }
    };

    // 计数失败不影响下载本身
    if let Some(ip) = client_ip(&headers, Some(remote_addr)) {
        if state
            .engagement
            .should_count_unique_event(&version_id, &ip, EventKind::Download)
            .await
        {
            if let Err(err) =
                resource::increment_download_counts(&state.pool, &version_id, &version.resource_id)
                    .await
            {
                tracing::error!("下载计数自增失败: {:?}", err);
            }
        }
    }

    Redirect::temporary(&version.download_url).into_response()
}
