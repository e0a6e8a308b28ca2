mod common;

use axum::http::StatusCode;
use common::TestApp;
use yatube::models::comment::CommentForm;
use yatube::services::PostFilter;

async fn count_rows(app: &TestApp, sql: &str, id: i64) -> i64 {
    sqlx::query_scalar::<_, i64>(sql)
        .bind(id)
        .fetch_one(app.state.db.pool())
        .await
        .unwrap()
}

#[tokio::test]
async fn test_deleting_group_keeps_its_posts() {
    let app = TestApp::new().await;
    let author = app.create_user("auth").await;
    let group = app.create_group("Cats", "cats").await;
    let post = app.create_post(&author, "Orphaned post", Some(&group)).await;

    sqlx::query("DELETE FROM post_groups WHERE id = ?")
        .bind(group.id)
        .execute(app.state.db.pool())
        .await
        .unwrap();

    let kept = app
        .state
        .post_service
        .get(post.id)
        .await
        .unwrap()
        .expect("post survives group deletion");
    assert_eq!(kept.group_id, None);
    assert_eq!(app.state.post_service.count(PostFilter::All).await.unwrap(), 1);

    let index = app.get("/", None).await;
    assert!(index.contains("Orphaned post"));
    assert!(!index.contains("href=\"/group/cats/\""));
    assert!(app.get("/profile/auth/", None).await.contains("Orphaned post"));
    assert_eq!(app.get("/group/cats/", None).await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_deleting_user_removes_their_content() {
    let app = TestApp::new().await;
    let author = app.create_user("auth").await;
    let reader = app.create_user("reader").await;
    let post = app.create_post(&author, "Soon gone", None).await;
    let reader_post = app.create_post(&reader, "Reader stays", None).await;

    app.state
        .comment_service
        .create(
            reader_post.id,
            author.id,
            &CommentForm {
                text: "Author comment".to_string(),
            },
        )
        .await
        .unwrap();
    app.state
        .comment_service
        .create(
            post.id,
            reader.id,
            &CommentForm {
                text: "Reader comment".to_string(),
            },
        )
        .await
        .unwrap();
    app.state.follow_service.follow(reader.id, author.id).await.unwrap();
    app.state.follow_service.follow(author.id, reader.id).await.unwrap();

    sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(author.id)
        .execute(app.state.db.pool())
        .await
        .unwrap();

    assert!(app.state.post_service.get(post.id).await.unwrap().is_none());
    assert_eq!(
        count_rows(&app, "SELECT COUNT(*) FROM posts WHERE author_id = ?", author.id).await,
        0
    );
    assert_eq!(
        count_rows(&app, "SELECT COUNT(*) FROM comments WHERE author_id = ?", author.id).await,
        0
    );
    assert_eq!(
        count_rows(&app, "SELECT COUNT(*) FROM comments WHERE post_id = ?", post.id).await,
        0
    );
    assert_eq!(app.state.follow_service.count().await.unwrap(), 0);

    // 其他用户的内容不受影响
    assert!(app.state.post_service.get(reader_post.id).await.unwrap().is_some());
    assert_eq!(app.get("/profile/auth/", None).await.status, StatusCode::NOT_FOUND);
}
