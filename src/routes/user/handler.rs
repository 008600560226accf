use std::net::SocketAddr;

use axum::{
    Json,
    extract::{ConnectInfo, Extension, State},
    http::HeaderMap,
};

use crate::{
    AppState,
    cache::keys::engagement_keys,
    database::operations::user,
    utils::{
        ApiResponse, Claims, client_ip, error_codes, error_to_api_response, generate_token,
        success_to_api_response, verify_password,
    },
};

use super::model::{CheckTokenResponse, LoginRequest, LoginResponse};

/// 用户登录
/// 进入凭证校验前先对来源IP做登录限流，防止密码爆破
#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    ConnectInfo(remote_addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(req): Json<LoginRequest>,
) -> Json<ApiResponse<LoginResponse>> {
    let ip = client_ip(&headers, Some(remote_addr)).unwrap_or_else(|| "unknown".to_string());
    let bucket = engagement_keys::login_rate_limit_key(&ip);

    let allowed = state
        .engagement
        .check_rate_limit(
            &bucket,
            state.config.login_rate_limit_attempts,
            state.config.login_rate_limit_window_secs,
        )
        .await;
    if !allowed {
        return error_to_api_response(
            error_codes::RATE_LIMIT,
            "登录尝试过于频繁，请稍后重试".to_string(),
        );
    }

    let user = match user::find_by_username(&state.pool, &req.username).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            return error_to_api_response(error_codes::NOT_FOUND, "用户不存在".to_string());
        }
        Err(err) => {
            tracing::error!("查询用户错误: {:?}", err);
            return error_to_api_response(error_codes::INTERNAL_ERROR, "数据库错误".to_string());
        }
    };

    // 验证密码
    match verify_password(&req.password, &user.password_hash) {
        Ok(true) => (),
        Ok(false) => {
            return error_to_api_response(error_codes::AUTH_FAILED, "密码无效".to_string());
        }
        Err(err) => {
            tracing::error!("密码校验错误: {:?}", err);
            return error_to_api_response(error_codes::INTERNAL_ERROR, "内部服务器错误".to_string());
        }
    }

    // 生成 token
    match generate_token(&user.user_id, &state.config) {
        Ok((token, _)) => success_to_api_response(LoginResponse {
            user_id: user.user_id,
            token,
        }),
        Err(_) => error_to_api_response(error_codes::INTERNAL_ERROR, "生成令牌失败".to_string()),
    }
}

/// 检查token是否有效，认证中间件已完成校验，直接返回声明内容
#[axum::debug_handler]
pub async fn check_token(Extension(claims): Extension<Claims>) -> Json<ApiResponse<CheckTokenResponse>> {
    success_to_api_response(CheckTokenResponse { user_id: claims.sub })
}
