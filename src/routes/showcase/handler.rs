use std::net::SocketAddr;

use axum::{
    Json,
    extract::{ConnectInfo, Extension, Path, State},
    http::HeaderMap,
};

use crate::{
    AppState,
    cache::EventKind,
    database::operations::showcase,
    utils::{
        ApiResponse, Claims, client_ip, error_codes, error_to_api_response,
        success_to_api_response,
    },
};

use super::model::{CreatePostRequest, CreatePostResponse, ShowcasePostResponse};

/// 获取展示帖详情
/// 同一IP对同一帖子每天只计一次浏览；计数判定从不阻塞读取
pub async fn get_post(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    ConnectInfo(remote_addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Json<ApiResponse<ShowcasePostResponse>> {
    let post = match showcase::find_post_by_id(&state.pool, &post_id).await {
        Ok(Some(post)) if post.is_published() => post,
        Ok(_) => {
            return error_to_api_response(error_codes::NOT_FOUND, "展示帖不存在".into());
        }
        Err(err) => {
            tracing::error!("查询展示帖错误: {:?}", err);
            return error_to_api_response(error_codes::INTERNAL_ERROR, "获取展示帖失败".into());
        }
    };

    // 去重通过才做持久化自增；自增失败只记录日志，不影响本次读取
    if let Some(ip) = client_ip(&headers, Some(remote_addr)) {
        if state
            .engagement
            .should_count_unique_event(&post_id, &ip, EventKind::View)
            .await
        {
            if let Err(err) = showcase::increment_view_count(&state.pool, &post_id).await {
                tracing::error!("浏览计数自增失败: {:?}", err);
            }
        }
    }

    success_to_api_response(ShowcasePostResponse::from(post))
}

/// 创建展示帖（需要认证）
pub async fn create_post(
    Extension(claims): Extension<Claims>,
    State(state): State<AppState>,
    Json(req): Json<CreatePostRequest>,
) -> Json<ApiResponse<CreatePostResponse>> {
    // 校验标题长度
    if req.title.trim().is_empty() || req.title.len() > 120 {
        return error_to_api_response(
            error_codes::VALIDATION_ERROR,
            "标题长度必须在1到120个字符之间".into(),
        );
    }

    let post_id = uuid::Uuid::new_v4().to_string();

    match showcase::create_post(&state.pool, &post_id, &claims.sub, &req.title, &req.content).await
    {
        Ok(post) => success_to_api_response(CreatePostResponse {
            post_id: post.post_id,
        }),
        Err(err) => {
            tracing::error!("创建展示帖错误: {:?}", err);
            error_to_api_response(error_codes::INTERNAL_ERROR, "创建展示帖失败".into())
        }
    }
}
