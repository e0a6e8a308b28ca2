use crate::{
    error::Result,
    state::AppState,
    utils::{
        middleware::OptionalAuth,
        templates::{Layout, TEMPLATES},
    },
};
use axum::{response::Html, routing::get, Router};
use serde_json::json;
use std::sync::Arc;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/author/", get(author))
        .route("/tech/", get(tech))
}

/// GET /about/author/
pub async fn author(OptionalAuth(user): OptionalAuth) -> Result<Html<String>> {
    Ok(TEMPLATES.render_page(
        "about/author",
        &json!({}),
        &Layout::new("About the author", user.as_ref()),
    )?)
}

/// GET /about/tech/
pub async fn tech(OptionalAuth(user): OptionalAuth) -> Result<Html<String>> {
    Ok(TEMPLATES.render_page(
        "about/tech",
        &json!({}),
        &Layout::new("Technologies", user.as_ref()),
    )?)
}
