use std::net::SocketAddr;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::{
    AppState,
    cache::keys::engagement_keys,
    utils::{client_ip, error_codes, error_to_api_response},
};

/// 全局限流中间件：对每个来源IP做固定窗口计数
/// 缓存不可用或出错时放行（可用性优先于限流精度）
pub async fn rate_limit(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    // 从连接信息获取原始IP，请求头中的IP优先
    let remote_addr = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0);
    let ip = client_ip(req.headers(), remote_addr).unwrap_or_else(|| "unknown".to_string());

    let key = engagement_keys::ip_rate_limit_key(&ip);
    let allowed = state
        .engagement
        .check_rate_limit(
            &key,
            state.config.rate_limit_requests,
            state.config.rate_limit_window().as_secs(),
        )
        .await;

    if !allowed {
        return (
            StatusCode::OK,
            error_to_api_response::<()>(
                error_codes::RATE_LIMIT,
                format!(
                    "请求过于频繁，请在{}秒后重试",
                    state.config.rate_limit_window().as_secs()
                ),
            ),
        )
            .into_response();
    }

    next.run(req).await
}
