#![allow(dead_code)]

use axum::{
    body::{Body, HttpBody},
    http::{header, HeaderMap, Request, StatusCode},
    Router,
};
use std::sync::Arc;
use tower::ServiceExt;
use yatube::{
    config::Config,
    models::{
        group::Group,
        post::{Post, PostForm},
        user::{SignupForm, User},
    },
    state::AppState,
};

pub const PASSWORD: &str = "correct-horse-battery";

/// 内存数据库上的完整应用
pub struct TestApp {
    pub state: Arc<AppState>,
    pub router: Router,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(header::LOCATION)
            .and_then(|value| value.to_str().ok())
    }

    /// 页面中的帖子卡片数量
    pub fn post_cards(&self) -> usize {
        self.body.matches("class=\"post-card\"").count()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.body.contains(needle)
    }
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(Config::default()).await
    }

    pub async fn with_config(config: Config) -> Self {
        let media_root = std::env::temp_dir().join(format!(
            "yatube-test-{}",
            uuid::Uuid::new_v4().simple()
        ));
        let config = Config {
            media_root: media_root.to_string_lossy().into_owned(),
            ..config
        };

        let state = Arc::new(AppState::new(config).await.expect("app state"));
        let router = yatube::app(state.clone());
        Self { state, router }
    }

    pub async fn create_user(&self, username: &str) -> User {
        let form = SignupForm {
            first_name: String::new(),
            last_name: String::new(),
            username: username.to_string(),
            email: format!("{}@example.com", username),
            password1: PASSWORD.to_string(),
            password2: PASSWORD.to_string(),
        };
        self.state
            .user_service
            .create_user(&form)
            .await
            .expect("create user")
    }

    /// 已登录用户的 Cookie 头
    pub fn cookie_for(&self, user: &User) -> String {
        let token = self
            .state
            .auth_service
            .issue_token(user.id)
            .expect("issue token");
        format!("{}={}", self.state.config.session_cookie_name, token)
    }

    pub async fn create_group(&self, title: &str, slug: &str) -> Group {
        self.state
            .group_service
            .create(title, Some(slug), &format!("Description of {}", title))
            .await
            .expect("create group")
    }

    pub async fn create_post(&self, author: &User, text: &str, group: Option<&Group>) -> Post {
        let form = PostForm {
            text: text.to_string(),
            group: group.map(|g| g.id),
        };
        self.state
            .post_service
            .create(author.id, &form, None)
            .await
            .expect("create post")
    }

    pub async fn request(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible");

        let status = response.status();
        let headers = response.headers().clone();

        let mut body = response.into_body();
        let mut bytes = Vec::new();
        while let Some(chunk) = body.data().await {
            bytes.extend_from_slice(&chunk.expect("body chunk"));
        }

        TestResponse {
            status,
            headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> TestResponse {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.request(builder.body(Body::empty()).expect("request"))
            .await
    }

    pub async fn post_form(
        &self,
        uri: &str,
        fields: &[(&str, &str)],
        cookie: Option<&str>,
    ) -> TestResponse {
        let body = serde_urlencoded::to_string(fields).expect("urlencode");
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.request(builder.body(Body::from(body)).expect("request"))
            .await
    }

    pub async fn post_multipart(
        &self,
        uri: &str,
        fields: &[(&str, &str)],
        file: Option<(&str, &str, &[u8])>,
        cookie: Option<&str>,
    ) -> TestResponse {
        const BOUNDARY: &str = "yatube-test-boundary";

        let mut body: Vec<u8> = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                    BOUNDARY, name, value
                )
                .as_bytes(),
            );
        }
        if let Some((name, file_name, data)) = file {
            body.extend_from_slice(
                format!(
                    "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                    BOUNDARY, name, file_name
                )
                .as_bytes(),
            );
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            );
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.request(builder.body(Body::from(body)).expect("request"))
            .await
    }
}

/// 测试用的小 PNG 图片
pub fn small_png() -> Vec<u8> {
    let img = image::RgbImage::from_pixel(2, 2, image::Rgb([10, 120, 200]));
    let mut bytes = std::io::Cursor::new(Vec::new());
    img.write_to(&mut bytes, image::ImageOutputFormat::Png)
        .expect("encode png");
    bytes.into_inner()
}
