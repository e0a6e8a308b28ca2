use crate::{
    error::{AppError, Result},
    models::user::{LoginForm, PasswordChangeForm, SignupForm},
    routes::redirect,
    state::AppState,
    utils::{
        middleware::{clear_session_cookie, session_cookie, OptionalAuth, RequireAuth},
        templates::{Layout, TEMPLATES},
        validation::{form_errors, is_safe_redirect, single_error},
    },
};
use axum::{
    extract::{Query, State},
    http::header,
    response::{Html, IntoResponse, Response},
    routing::get,
    Form, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info};
use validator::Validate;

#[derive(Debug, Default, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/signup/", get(signup_form).post(signup))
        .route("/login/", get(login_form).post(login))
        .route("/logout/", get(logout).post(logout))
        .route(
            "/password_change/",
            get(password_change_form).post(password_change),
        )
        .route("/password_change/done/", get(password_change_done))
}

fn render_signup(form: &SignupForm, errors: Option<&validator::ValidationErrors>) -> Result<Html<String>> {
    Ok(TEMPLATES.render_page(
        "users/signup",
        &json!({
            "form": form,
            "errors": errors.map(form_errors),
        }),
        &Layout::new("Sign up", None),
    )?)
}

fn render_login(form: &LoginForm, errors: Option<&validator::ValidationErrors>) -> Result<Html<String>> {
    Ok(TEMPLATES.render_page(
        "users/login",
        &json!({
            "form": form,
            "next": form.next.clone().unwrap_or_default(),
            "errors": errors.map(form_errors),
        }),
        &Layout::new("Log in", None),
    )?)
}

/// GET /auth/signup/
pub async fn signup_form() -> Result<Html<String>> {
    render_signup(&SignupForm::default(), None)
}

/// 注册新用户，成功后跳转到首页
/// POST /auth/signup/
pub async fn signup(
    State(state): State<Arc<AppState>>,
    Form(form): Form<SignupForm>,
) -> Result<Response> {
    debug!("Signup attempt for username: {}", form.username);

    if let Err(errors) = form.check() {
        return Ok(render_signup(&form, Some(&errors))?.into_response());
    }

    match state.user_service.create_user(&form).await {
        Ok(user) => {
            info!("Registered user: {} ({})", user.username, user.id);
            Ok(redirect("/"))
        }
        Err(AppError::ValidatorError(errors)) => {
            Ok(render_signup(&form, Some(&errors))?.into_response())
        }
        Err(e) => Err(e),
    }
}

/// GET /auth/login/
pub async fn login_form(Query(query): Query<NextQuery>) -> Result<Html<String>> {
    let form = LoginForm {
        next: query.next,
        ..LoginForm::default()
    };
    render_login(&form, None)
}

/// 登录，成功后写入会话 Cookie 并跳转
/// POST /auth/login/
pub async fn login(
    State(state): State<Arc<AppState>>,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    debug!("Login attempt for username: {}", form.username);

    if let Err(errors) = form.validate() {
        return Ok(render_login(&form, Some(&errors))?.into_response());
    }

    let Some(user) = state
        .user_service
        .authenticate(&form.username, &form.password)
        .await?
    else {
        let errors = single_error(
            "__all__",
            "invalid_login",
            "Please enter a correct username and password. Note that both fields may be case-sensitive.",
        );
        return Ok(render_login(&form, Some(&errors))?.into_response());
    };

    let token = state.auth_service.issue_token(user.id)?;
    let target = form
        .next
        .as_deref()
        .filter(|next| is_safe_redirect(next))
        .unwrap_or("/")
        .to_string();

    info!("User logged in: {} ({})", user.username, user.id);

    let mut response = redirect(target);
    response.headers_mut().insert(
        header::SET_COOKIE,
        session_cookie(&state.config, &token)
            .parse()
            .map_err(|_| AppError::internal("Invalid session cookie"))?,
    );
    Ok(response)
}

/// 退出登录
/// GET|POST /auth/logout/
pub async fn logout(
    State(state): State<Arc<AppState>>,
    OptionalAuth(user): OptionalAuth,
) -> Result<Response> {
    if let Some(user) = &user {
        info!("User logged out: {} ({})", user.username, user.id);
    }

    let html = TEMPLATES.render_page("users/logged_out", &json!({}), &Layout::new("Logged out", None))?;
    Ok((
        [(header::SET_COOKIE, clear_session_cookie(&state.config))],
        html,
    )
        .into_response())
}

/// GET /auth/password_change/
pub async fn password_change_form(RequireAuth(user): RequireAuth) -> Result<Html<String>> {
    Ok(TEMPLATES.render_page(
        "users/password_change_form",
        &json!({}),
        &Layout::new("Change password", Some(&user)),
    )?)
}

/// 修改密码
/// POST /auth/password_change/
pub async fn password_change(
    State(state): State<Arc<AppState>>,
    RequireAuth(user): RequireAuth,
    Form(form): Form<PasswordChangeForm>,
) -> Result<Response> {
    let result = match form.check() {
        Ok(()) => state.user_service.change_password(&user, &form).await,
        Err(errors) => Err(AppError::ValidatorError(errors)),
    };

    match result {
        Ok(()) => Ok(redirect("/auth/password_change/done/")),
        Err(AppError::ValidatorError(errors)) => Ok(TEMPLATES
            .render_page(
                "users/password_change_form",
                &json!({ "errors": form_errors(&errors) }),
                &Layout::new("Change password", Some(&user)),
            )?
            .into_response()),
        Err(e) => Err(e),
    }
}

/// GET /auth/password_change/done/
pub async fn password_change_done(RequireAuth(user): RequireAuth) -> Result<Html<String>> {
    Ok(TEMPLATES.render_page(
        "users/password_change_done",
        &json!({}),
        &Layout::new("Password changed", Some(&user)),
    )?)
}
