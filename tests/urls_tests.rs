mod common;

use axum::http::StatusCode;
use common::TestApp;

#[tokio::test]
async fn test_public_pages_are_available() {
    let app = TestApp::new().await;
    let author = app.create_user("auth").await;
    let group = app.create_group("Test group", "test-slug").await;
    let post = app.create_post(&author, "Test post text", Some(&group)).await;

    for uri in [
        "/".to_string(),
        "/group/test-slug/".to_string(),
        "/profile/auth/".to_string(),
        format!("/posts/{}/", post.id),
        "/about/author/".to_string(),
        "/about/tech/".to_string(),
        "/auth/signup/".to_string(),
        "/auth/login/".to_string(),
        "/health".to_string(),
    ] {
        let response = app.get(&uri, None).await;
        assert_eq!(response.status, StatusCode::OK, "GET {}", uri);
    }
}

#[tokio::test]
async fn test_unknown_pages_return_404() {
    let app = TestApp::new().await;
    let author = app.create_user("auth").await;
    app.create_post(&author, "Text", None).await;

    for uri in [
        "/unexisting_page/",
        "/group/no-such-group/",
        "/profile/nobody/",
        "/posts/999/",
        "/posts/abc/",
    ] {
        let response = app.get(uri, None).await;
        assert_eq!(response.status, StatusCode::NOT_FOUND, "GET {}", uri);
    }

    let response = app.get("/unexisting_page/", None).await;
    assert!(response.contains("data-status=\"404\""));
}

#[tokio::test]
async fn test_login_required_pages_redirect_anonymous() {
    let app = TestApp::new().await;
    let author = app.create_user("auth").await;
    let post = app.create_post(&author, "Text", None).await;

    let cases = [
        ("/create/".to_string(), "/auth/login/?next=/create/".to_string()),
        ("/follow/".to_string(), "/auth/login/?next=/follow/".to_string()),
        (
            format!("/posts/{}/edit/", post.id),
            format!("/auth/login/?next=/posts/{}/edit/", post.id),
        ),
        (
            "/profile/auth/follow/".to_string(),
            "/auth/login/?next=/profile/auth/follow/".to_string(),
        ),
        (
            "/auth/password_change/".to_string(),
            "/auth/login/?next=/auth/password_change/".to_string(),
        ),
    ];

    for (uri, expected) in cases {
        let response = app.get(&uri, None).await;
        assert_eq!(response.status, StatusCode::FOUND, "GET {}", uri);
        assert_eq!(response.location(), Some(expected.as_str()), "GET {}", uri);
    }
}

#[tokio::test]
async fn test_authorized_pages_available_to_users() {
    let app = TestApp::new().await;
    let author = app.create_user("auth").await;
    let post = app.create_post(&author, "Text", None).await;
    let cookie = app.cookie_for(&author);

    for uri in [
        "/create/".to_string(),
        "/follow/".to_string(),
        format!("/posts/{}/edit/", post.id),
        "/auth/password_change/".to_string(),
    ] {
        let response = app.get(&uri, Some(&cookie)).await;
        assert_eq!(response.status, StatusCode::OK, "GET {}", uri);
    }
}

#[tokio::test]
async fn test_edit_by_non_author_redirects_to_detail() {
    let app = TestApp::new().await;
    let author = app.create_user("auth").await;
    let other = app.create_user("other").await;
    let post = app.create_post(&author, "Text", None).await;

    let response = app
        .get(&format!("/posts/{}/edit/", post.id), Some(&app.cookie_for(&other)))
        .await;
    assert_eq!(response.status, StatusCode::FOUND);
    assert_eq!(response.location(), Some(format!("/posts/{}/", post.id).as_str()));
}

#[tokio::test]
async fn test_invalid_session_is_treated_as_anonymous() {
    let app = TestApp::new().await;

    let response = app.get("/create/", Some("yatube_session=garbage")).await;
    assert_eq!(response.status, StatusCode::FOUND);

    let response = app.get("/", Some("yatube_session=garbage")).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.contains("href=\"/auth/login/\""));
}
