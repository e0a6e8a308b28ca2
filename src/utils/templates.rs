use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use handlebars::{Handlebars, RenderError, TemplateError};
use once_cell::sync::Lazy;
use serde::Serialize;
use serde_json::json;

use crate::models::user::User;

/// 内嵌模板：(名称, 源码)
const SOURCES: &[(&str, &str)] = &[
    ("base", include_str!("../../templates/base.hbs")),
    ("post_card", include_str!("../../templates/includes/post_card.hbs")),
    ("paginator", include_str!("../../templates/includes/paginator.hbs")),
    ("form_errors", include_str!("../../templates/includes/form_errors.hbs")),
    ("posts/index", include_str!("../../templates/posts/index.hbs")),
    ("posts/post_list", include_str!("../../templates/posts/post_list.hbs")),
    ("posts/group_list", include_str!("../../templates/posts/group_list.hbs")),
    ("posts/profile", include_str!("../../templates/posts/profile.hbs")),
    ("posts/post_detail", include_str!("../../templates/posts/post_detail.hbs")),
    ("posts/create_post", include_str!("../../templates/posts/create_post.hbs")),
    ("posts/follow", include_str!("../../templates/posts/follow.hbs")),
    ("users/signup", include_str!("../../templates/users/signup.hbs")),
    ("users/login", include_str!("../../templates/users/login.hbs")),
    ("users/logged_out", include_str!("../../templates/users/logged_out.hbs")),
    ("users/password_change_form", include_str!("../../templates/users/password_change_form.hbs")),
    ("users/password_change_done", include_str!("../../templates/users/password_change_done.hbs")),
    ("about/author", include_str!("../../templates/about/author.hbs")),
    ("about/tech", include_str!("../../templates/about/tech.hbs")),
    ("core/error", include_str!("../../templates/core/error.hbs")),
];

pub static TEMPLATES: Lazy<Templates> =
    Lazy::new(|| Templates::new().expect("embedded templates must compile"));

/// Handlebars 模板注册表
pub struct Templates {
    registry: Handlebars<'static>,
}

/// 基础布局所需的信息
#[derive(Debug, Clone, Serialize)]
pub struct Layout<'a> {
    pub title: &'a str,
    pub user: Option<&'a User>,
}

impl<'a> Layout<'a> {
    pub fn new(title: &'a str, user: Option<&'a User>) -> Self {
        Self { title, user }
    }
}

impl Templates {
    pub fn new() -> Result<Self, TemplateError> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(false);
        for (name, source) in SOURCES {
            registry.register_template_string(name, *source)?;
        }
        Ok(Self { registry })
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.registry.has_template(name)
    }

    /// 渲染单个模板（不含布局）
    pub fn render<T: Serialize>(&self, name: &str, data: &T) -> Result<String, RenderError> {
        self.registry.render(name, data)
    }

    /// 渲染页面主体后套入基础布局
    pub fn render_page<T: Serialize>(
        &self,
        name: &str,
        data: &T,
        layout: &Layout<'_>,
    ) -> Result<Html<String>, RenderError> {
        let body = self.render(name, data)?;
        self.wrap(body, layout)
    }

    /// 将已渲染的片段套入基础布局
    pub fn wrap(&self, body: String, layout: &Layout<'_>) -> Result<Html<String>, RenderError> {
        let html = self.registry.render(
            "base",
            &json!({
                "title": layout.title,
                "user": layout.user,
                "is_authenticated": layout.user.is_some(),
                "body": body,
            }),
        )?;
        Ok(Html(html))
    }
}

/// 错误页面。渲染失败时退回纯文本
pub fn error_page(status: StatusCode, message: &str) -> Response {
    let title = status.canonical_reason().unwrap_or("Error");
    let rendered = TEMPLATES.render_page(
        "core/error",
        &json!({
            "status": status.as_u16(),
            "reason": title,
            "message": message,
            "is_not_found": status == StatusCode::NOT_FOUND,
        }),
        &Layout::new(title, None),
    );

    match rendered {
        Ok(html) => (status, html).into_response(),
        Err(e) => {
            tracing::error!("Failed to render error page: {}", e);
            (status, format!("{} {}", status.as_u16(), title)).into_response()
        }
    }
}
