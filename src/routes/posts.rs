use crate::{
    error::{AppError, Result},
    models::{
        comment::{CommentForm, CommentView},
        group::GroupChoice,
        post::{ImageUpload, Post, PostForm, PostSubmission, PostView},
        user::User,
    },
    routes::{parse_id, redirect},
    services::PostFilter,
    state::AppState,
    utils::{
        cache::index_page_key,
        middleware::{OptionalAuth, RequireAuth},
        pagination::Page,
        templates::{Layout, TEMPLATES},
        validation::form_errors,
    },
};
use axum::{
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Form, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, warn};
use validator::{Validate, ValidationErrors};

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(index))
        .route("/group/:slug/", get(group_posts))
        .route("/profile/:username/", get(profile))
        .route(
            "/profile/:username/follow/",
            get(profile_follow).post(profile_follow),
        )
        .route(
            "/profile/:username/unfollow/",
            get(profile_unfollow).post(profile_unfollow),
        )
        .route("/posts/:post_id/", get(post_detail))
        .route("/posts/:post_id/edit/", get(post_edit_form).post(post_edit))
        .route("/posts/:post_id/delete/", get(post_delete).post(post_delete))
        .route("/posts/:post_id/comment/", post(add_comment))
        .route(
            "/posts/:post_id/:comment_id/delete/",
            get(delete_comment).post(delete_comment),
        )
        .route("/create/", get(post_create_form).post(post_create))
        .route("/follow/", get(follow_index))
}

/// 渲染帖子列表片段（帖子卡片加分页导航）
fn render_post_list(page: &Page<PostView>) -> Result<String> {
    Ok(TEMPLATES.render("posts/post_list", &json!({ "page": page }))?)
}

/// 首页：所有帖子，列表片段按页码缓存
/// GET /
pub async fn index(
    State(state): State<Arc<AppState>>,
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<PageQuery>,
) -> Result<Html<String>> {
    let key = index_page_key(query.page.as_deref());

    let post_list = match state.index_cache.get(&key) {
        Some(fragment) => {
            debug!("Serving cached fragment: {}", key);
            fragment
        }
        None => {
            debug!("Rendering index page: {}", key);
            let page = state
                .post_service
                .list(
                    PostFilter::All,
                    query.page.as_deref(),
                    state.get_page_size("posts"),
                )
                .await?;
            let fragment = render_post_list(&page)?;
            state.index_cache.set(key, fragment.clone());
            fragment
        }
    };

    Ok(TEMPLATES.render_page(
        "posts/index",
        &json!({ "post_list": post_list }),
        &Layout::new("Latest updates on the site", user.as_ref()),
    )?)
}

/// 分组中的帖子
/// GET /group/:slug/
pub async fn group_posts(
    State(state): State<Arc<AppState>>,
    OptionalAuth(user): OptionalAuth,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Html<String>> {
    debug!("Fetching posts for group: {}", slug);

    let group = state
        .group_service
        .get_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::not_found("Group"))?;

    let page = state
        .post_service
        .list(
            PostFilter::Group(group.id),
            query.page.as_deref(),
            state.get_page_size("posts"),
        )
        .await?;

    let title = format!("Posts of group {}", group.title);
    Ok(TEMPLATES.render_page(
        "posts/group_list",
        &json!({
            "group": group,
            "post_list": render_post_list(&page)?,
        }),
        &Layout::new(&title, user.as_ref()),
    )?)
}

/// 作者主页
/// GET /profile/:username/
pub async fn profile(
    State(state): State<Arc<AppState>>,
    OptionalAuth(user): OptionalAuth,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Html<String>> {
    debug!("Fetching profile: {}", username);

    let author = state.user_service.get_required(&username).await?;

    let page = state
        .post_service
        .list(
            PostFilter::Author(author.id),
            query.page.as_deref(),
            state.get_page_size("posts"),
        )
        .await?;

    let can_follow = matches!(&user, Some(viewer) if viewer.id != author.id);
    let following = match &user {
        Some(viewer) if can_follow => state.follow_service.is_following(viewer.id, author.id).await?,
        _ => false,
    };

    let full_name = author.full_name();
    let title = format!(
        "Profile of {}",
        if full_name.is_empty() { &author.username } else { &full_name }
    );

    Ok(TEMPLATES.render_page(
        "posts/profile",
        &json!({
            "profile": {
                "username": author.username,
                "full_name": full_name,
            },
            "posts_count": page.count,
            "can_follow": can_follow,
            "following": following,
            "post_list": render_post_list(&page)?,
        }),
        &Layout::new(&title, user.as_ref()),
    )?)
}

#[derive(Debug, Serialize)]
struct CommentItem {
    #[serde(flatten)]
    comment: CommentView,
    can_delete: bool,
}

/// 帖子详情，附带评论表单和评论列表
/// GET /posts/:post_id/
pub async fn post_detail(
    State(state): State<Arc<AppState>>,
    OptionalAuth(user): OptionalAuth,
    Path(post_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Html<String>> {
    let post_id = parse_id(&post_id)?;
    debug!("Fetching post: {}", post_id);

    let post = state
        .post_service
        .get_view(post_id)
        .await?
        .ok_or_else(|| AppError::not_found("Post"))?;

    let posts_count = state.post_service.count_by_author(post.author_id).await?;
    let viewer_id = user.as_ref().map(|u| u.id);

    let comments = state
        .comment_service
        .list_for_post(
            post_id,
            query.page.as_deref(),
            state.get_page_size("comments"),
        )
        .await?
        .map(|comment| CommentItem {
            can_delete: viewer_id == Some(comment.author_id),
            comment,
        });

    let is_author = viewer_id == Some(post.author_id);
    let title: String = post.text.chars().take(30).collect();
    Ok(TEMPLATES.render_page(
        "posts/post_detail",
        &json!({
            "post": post,
            "posts_count": posts_count,
            "comments_count": comments.count,
            "is_author": is_author,
            "is_authenticated": user.is_some(),
            "form": CommentForm::default(),
            "page": comments,
        }),
        &Layout::new(&title, user.as_ref()),
    )?)
}

/// 渲染新建或编辑帖子的表单
async fn render_post_form(
    state: &AppState,
    user: &User,
    form: &PostForm,
    errors: Option<&ValidationErrors>,
    editing: Option<&Post>,
) -> Result<Html<String>> {
    let groups = state.group_service.list().await?;
    let title = if editing.is_some() { "Edit post" } else { "New post" };

    Ok(TEMPLATES.render_page(
        "posts/create_post",
        &json!({
            "is_edit": editing.is_some(),
            "post_id": editing.map(|p| p.id),
            "current_image": editing.and_then(|p| p.image.clone()),
            "form": form,
            "groups": GroupChoice::list(&groups, form.group),
            "errors": errors.map(form_errors),
        }),
        &Layout::new(title, Some(user)),
    )?)
}

/// 校验表单并保存上传的图片，返回图片路径
async fn process_submission(
    state: &AppState,
    form: &PostForm,
    image: Option<&ImageUpload>,
) -> Result<Option<String>> {
    form.validate()?;
    state.post_service.ensure_group(form.group).await?;

    match image {
        Some(upload) => Ok(Some(state.media_service.save_post_image(upload).await?)),
        None => Ok(None),
    }
}

/// 删除不再被引用的图片。失败只记录日志，不影响请求结果
async fn discard_image(state: &AppState, image: Option<&str>) {
    let Some(image) = image else {
        return;
    };
    if let Err(e) = state.media_service.delete_file(image).await {
        warn!("Failed to delete image {}: {}", image, e);
    }
}

/// GET /create/
pub async fn post_create_form(
    State(state): State<Arc<AppState>>,
    RequireAuth(user): RequireAuth,
) -> Result<Html<String>> {
    render_post_form(&state, &user, &PostForm::default(), None, None).await
}

/// 新建帖子，成功后跳转到作者主页
/// POST /create/
pub async fn post_create(
    State(state): State<Arc<AppState>>,
    RequireAuth(user): RequireAuth,
    submission: PostSubmission,
) -> Result<Response> {
    debug!("Creating post for user: {}", user.id);
    let PostSubmission { form, image } = submission;

    let image_path = match process_submission(&state, &form, image.as_ref()).await {
        Ok(path) => path,
        Err(AppError::ValidatorError(errors)) => {
            return Ok(render_post_form(&state, &user, &form, Some(&errors), None)
                .await?
                .into_response());
        }
        Err(e) => return Err(e),
    };

    let post = match state.post_service.create(user.id, &form, image_path.clone()).await {
        Ok(post) => post,
        Err(e) => {
            discard_image(&state, image_path.as_deref()).await;
            return Err(e);
        }
    };
    info!("Created post: {} by user: {}", post.id, user.id);

    Ok(redirect(format!("/profile/{}/", user.username)))
}

/// GET /posts/:post_id/edit/
pub async fn post_edit_form(
    State(state): State<Arc<AppState>>,
    RequireAuth(user): RequireAuth,
    Path(post_id): Path<String>,
) -> Result<Response> {
    let post = state.post_service.get_required(parse_id(&post_id)?).await?;

    if post.author_id != user.id {
        debug!("User {} is not the author of post {}", user.id, post.id);
        return Ok(redirect(format!("/posts/{}/", post.id)));
    }

    let form = PostForm::from_post(&post);
    Ok(render_post_form(&state, &user, &form, None, Some(&post))
        .await?
        .into_response())
}

/// 编辑帖子，只有作者可以修改
/// POST /posts/:post_id/edit/
pub async fn post_edit(
    State(state): State<Arc<AppState>>,
    RequireAuth(user): RequireAuth,
    Path(post_id): Path<String>,
    submission: PostSubmission,
) -> Result<Response> {
    let post = state.post_service.get_required(parse_id(&post_id)?).await?;
    debug!("Updating post: {} by user: {}", post.id, user.id);

    if post.author_id != user.id {
        return Ok(redirect(format!("/posts/{}/", post.id)));
    }

    let PostSubmission { form, image } = submission;
    let image_path = match process_submission(&state, &form, image.as_ref()).await {
        Ok(path) => path,
        Err(AppError::ValidatorError(errors)) => {
            return Ok(render_post_form(&state, &user, &form, Some(&errors), Some(&post))
                .await?
                .into_response());
        }
        Err(e) => return Err(e),
    };

    let replaced_image = image_path.as_ref().and(post.image.clone());
    if let Err(e) = state.post_service.update(post.id, &form, image_path.clone()).await {
        discard_image(&state, image_path.as_deref()).await;
        return Err(e);
    }
    discard_image(&state, replaced_image.as_deref()).await;

    info!("Updated post: {} by user: {}", post.id, user.id);
    Ok(redirect(format!("/posts/{}/", post.id)))
}

/// 删除帖子，只有作者可以删除
/// GET|POST /posts/:post_id/delete/
pub async fn post_delete(
    State(state): State<Arc<AppState>>,
    RequireAuth(user): RequireAuth,
    Path(post_id): Path<String>,
) -> Result<Response> {
    let post = state.post_service.get_required(parse_id(&post_id)?).await?;

    if post.author_id != user.id {
        debug!("User {} may not delete post {}", user.id, post.id);
        return Ok(redirect(format!("/posts/{}/", post.id)));
    }

    state.post_service.delete(post.id).await?;
    discard_image(&state, post.image.as_deref()).await;

    info!("Deleted post: {} by user: {}", post.id, user.id);
    Ok(redirect(format!("/profile/{}/", user.username)))
}

/// 添加评论，无论是否有效都返回帖子详情
/// POST /posts/:post_id/comment/
pub async fn add_comment(
    State(state): State<Arc<AppState>>,
    RequireAuth(user): RequireAuth,
    Path(post_id): Path<String>,
    Form(form): Form<CommentForm>,
) -> Result<Response> {
    let post = state.post_service.get_required(parse_id(&post_id)?).await?;

    if form.validate().is_ok() {
        let comment = state.comment_service.create(post.id, user.id, &form).await?;
        info!("Created comment: {} on post: {}", comment.id, post.id);
    } else {
        debug!("Discarding invalid comment on post {}", post.id);
    }

    Ok(redirect(format!("/posts/{}/", post.id)))
}

/// 删除评论，只有评论作者可以删除
/// GET|POST /posts/:post_id/:comment_id/delete/
pub async fn delete_comment(
    State(state): State<Arc<AppState>>,
    RequireAuth(user): RequireAuth,
    Path((post_id, comment_id)): Path<(String, String)>,
) -> Result<Response> {
    let post = state.post_service.get_required(parse_id(&post_id)?).await?;
    let comment = state
        .comment_service
        .get_for_post(post.id, parse_id(&comment_id)?)
        .await?;

    if comment.author_id == user.id {
        state.comment_service.delete(comment.id).await?;
        info!("Deleted comment: {} by user: {}", comment.id, user.id);
    } else {
        debug!("User {} may not delete comment {}", user.id, comment.id);
    }

    Ok(redirect(format!("/posts/{}/", post.id)))
}

/// 关注的作者发布的帖子
/// GET /follow/
pub async fn follow_index(
    State(state): State<Arc<AppState>>,
    RequireAuth(user): RequireAuth,
    Query(query): Query<PageQuery>,
) -> Result<Html<String>> {
    debug!("Fetching followed feed for user: {}", user.id);

    let page = state
        .post_service
        .list(
            PostFilter::FollowedBy(user.id),
            query.page.as_deref(),
            state.get_page_size("posts"),
        )
        .await?;

    Ok(TEMPLATES.render_page(
        "posts/follow",
        &json!({ "post_list": render_post_list(&page)? }),
        &Layout::new("Subscriptions", Some(&user)),
    )?)
}

/// GET|POST /profile/:username/follow/
pub async fn profile_follow(
    State(state): State<Arc<AppState>>,
    RequireAuth(user): RequireAuth,
    Path(username): Path<String>,
) -> Result<Response> {
    let author = state.user_service.get_required(&username).await?;
    state.follow_service.follow(user.id, author.id).await?;

    Ok(redirect(format!("/profile/{}/", author.username)))
}

/// GET|POST /profile/:username/unfollow/
pub async fn profile_unfollow(
    State(state): State<Arc<AppState>>,
    RequireAuth(user): RequireAuth,
    Path(username): Path<String>,
) -> Result<Response> {
    let author = state.user_service.get_required(&username).await?;
    state.follow_service.unfollow(user.id, author.id).await?;

    Ok(redirect(format!("/profile/{}/", author.username)))
}
