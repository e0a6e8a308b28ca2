pub mod about;
pub mod posts;
pub mod users;

use crate::{
    error::{AppError, Result},
    state::AppState,
    utils::middleware::{auth_middleware, request_logging_middleware},
};
use axum::{
    extract::DefaultBodyLimit,
    http::{header, StatusCode, Uri},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::sync::Arc;
use tower_http::{compression::CompressionLayer, services::ServeDir, trace::TraceLayer};

/// multipart 表单中除图片外的其他字段
const FORM_OVERHEAD: usize = 64 * 1024;

/// 构建应用路由
pub fn app(state: Arc<AppState>) -> Router {
    let media = ServeDir::new(&state.config.media_root);
    let body_limit = state.config.max_upload_size + FORM_OVERHEAD;

    Router::new()
        .merge(posts::router())
        .nest("/auth", users::router())
        .nest("/about", about::router())
        .route("/health", get(health_check))
        .nest_service("/media", media)
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .layer(middleware::from_fn(request_logging_middleware))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "Yatube is running!"
}

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("No page at {}", uri.path()))
}

/// 302 重定向
pub fn redirect(location: impl Into<String>) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.into())]).into_response()
}

/// 路径中的数字 ID，无法解析时视为不存在
pub fn parse_id(raw: &str) -> Result<i64> {
    raw.parse::<i64>()
        .map_err(|_| AppError::NotFound(format!("No object with id {}", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("12").unwrap(), 12);
        assert!(parse_id("abc").unwrap_err().is_not_found());
        assert!(parse_id("").unwrap_err().is_not_found());
    }

    #[test]
    fn test_redirect_is_302() {
        let response = redirect("/posts/1/");
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/posts/1/");
    }
}
