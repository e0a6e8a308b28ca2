use crate::{config::Config, error::AppError, models::user::User, state::AppState};
use async_trait::async_trait;
use axum::{
    body::Body,
    extract::{FromRequestParts, OriginalUri, State},
    headers::{Cookie, HeaderMapExt},
    http::{header, request::Parts, HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use std::{net::SocketAddr, sync::Arc};
use tracing::{debug, info, warn};

/// 认证中间件：从会话 Cookie 或 Bearer 头解析当前用户
pub async fn auth_middleware(
    State(app_state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next<Body>,
) -> Response {
    if let Some(token) = session_token(request.headers(), &app_state.config.session_cookie_name) {
        match app_state.auth_service.verify_jwt(&token) {
            Ok(claims) => match claims.user_id() {
                Some(user_id) => match app_state.user_service.get_by_id(user_id).await {
                    Ok(Some(user)) => {
                        debug!("Authenticated user: {} ({})", user.username, user.id);
                        request.extensions_mut().insert(user);
                    }
                    Ok(None) => debug!("Session refers to missing user {}", user_id),
                    Err(e) => warn!("Failed to load session user {}: {}", user_id, e),
                },
                None => debug!("Session subject is not a user id: {}", claims.sub),
            },
            Err(e) => {
                // 令牌无效时按匿名请求处理
                debug!("Ignoring invalid session token: {}", e);
            }
        }
    }

    next.run(request).await
}

/// 请求日志中间件
pub async fn request_logging_middleware(request: Request<Body>, next: Next<Body>) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let client_ip = get_client_ip(&request);

    let start_time = std::time::Instant::now();

    debug!("Incoming request: {} {} from {}", method, uri, client_ip);

    let response = next.run(request).await;

    let elapsed = start_time.elapsed();
    let status = response.status();

    info!(
        "Request completed: {} {} {} - {}ms",
        method,
        uri,
        status.as_u16(),
        elapsed.as_millis()
    );

    response
}

/// 从 Cookie 或 Authorization 头中取出会话令牌
fn session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    if let Some(cookie) = headers.typed_get::<Cookie>() {
        if let Some(token) = cookie.get(cookie_name).filter(|t| !t.is_empty()) {
            return Some(token.to_string());
        }
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
}

/// 登录后写入的会话 Cookie
pub fn session_cookie(config: &Config, token: &str) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        config.session_cookie_name,
        token,
        config.session_ttl_hours * 3600
    );
    if config.is_production() {
        cookie.push_str("; Secure");
    }
    cookie
}

/// 退出登录时清除会话 Cookie
pub fn clear_session_cookie(config: &Config) -> String {
    format!(
        "{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0",
        config.session_cookie_name
    )
}

/// 获取客户端 IP 地址
fn get_client_ip(request: &Request<Body>) -> String {
    let headers = request.headers();

    if let Some(forwarded_for) = headers.get("x-forwarded-for") {
        if let Ok(ip_str) = forwarded_for.to_str() {
            if let Some(ip) = ip_str.split(',').next() {
                return ip.trim().to_string();
            }
        }
    }

    if let Some(real_ip) = headers.get("x-real-ip") {
        if let Ok(ip_str) = real_ip.to_str() {
            return ip_str.to_string();
        }
    }

    request
        .extensions()
        .get::<axum::extract::ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// 可选认证提取器
pub struct OptionalAuth(pub Option<User>);

#[async_trait]
impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts.extensions.get::<User>().cloned();
        Ok(OptionalAuth(user))
    }
}

/// 必须登录的提取器，匿名用户被重定向到登录页
pub struct RequireAuth(pub User);

#[async_trait]
impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<User>().cloned() {
            Some(user) => Ok(RequireAuth(user)),
            None => {
                // 嵌套路由会去掉前缀，优先使用原始 URI
                let uri = parts
                    .extensions
                    .get::<OriginalUri>()
                    .map(|original| original.0.clone())
                    .unwrap_or_else(|| parts.uri.clone());
                let next = uri
                    .path_and_query()
                    .map(|pq| pq.as_str().to_string())
                    .unwrap_or_else(|| uri.path().to_string());
                debug!("Anonymous request to {} requires login", next);
                Err(AppError::login_required(next))
            }
        }
    }
}
