use crate::{
    error::{AppError, Result},
    models::comment::*,
    services::Database,
    utils::pagination::{Page, Paginator},
};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Clone)]
pub struct CommentService {
    db: Arc<Database>,
}

impl CommentService {
    pub async fn new(db: Arc<Database>) -> Result<Self> {
        Ok(Self { db })
    }

    pub async fn create(&self, post_id: i64, author_id: i64, form: &CommentForm) -> Result<Comment> {
        debug!("Creating comment on post {} by {}", post_id, author_id);

        let id = sqlx::query(
            "INSERT INTO comments (post_id, author_id, text, pub_date) VALUES (?, ?, ?, ?)",
        )
        .bind(post_id)
        .bind(author_id)
        .bind(&form.text)
        .bind(Utc::now())
        .execute(self.db.pool())
        .await?
        .last_insert_rowid();

        info!("Comment {} created on post {}", id, post_id);

        self.get(id)
            .await?
            .ok_or_else(|| AppError::internal("Comment vanished after insert"))
    }

    pub async fn get(&self, comment_id: i64) -> Result<Option<Comment>> {
        let comment = sqlx::query_as::<_, Comment>(
            "SELECT id, post_id, author_id, text, pub_date FROM comments WHERE id = ?",
        )
        .bind(comment_id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(comment)
    }

    /// 获取属于指定帖子的评论
    pub async fn get_for_post(&self, post_id: i64, comment_id: i64) -> Result<Comment> {
        match self.get(comment_id).await? {
            Some(comment) if comment.post_id == post_id => Ok(comment),
            _ => Err(AppError::not_found("Comment")),
        }
    }

    pub async fn delete(&self, comment_id: i64) -> Result<()> {
        debug!("Deleting comment: {}", comment_id);

        let result = sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(comment_id)
            .execute(self.db.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Comment"));
        }

        info!("Comment {} deleted", comment_id);
        Ok(())
    }

    pub async fn count(&self, post_id: i64) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM comments WHERE post_id = ?")
            .bind(post_id)
            .fetch_one(self.db.pool())
            .await?;

        Ok(count)
    }

    /// 帖子的评论，最新的在前
    pub async fn list_for_post(
        &self,
        post_id: i64,
        page: Option<&str>,
        per_page: usize,
    ) -> Result<Page<CommentView>> {
        let count = self.count(post_id).await?;
        let paginator = Paginator::new(count as usize, per_page);
        let number = paginator.resolve_page(page);
        let (offset, limit) = paginator.bounds(number);

        let comments = sqlx::query_as::<_, CommentView>(
            r#"
            SELECT c.id, c.post_id, c.author_id, u.username AS author_username, c.text, c.pub_date
            FROM comments c
            JOIN users u ON u.id = c.author_id
            WHERE c.post_id = ?
            ORDER BY c.pub_date DESC, c.id DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(post_id)
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(self.db.pool())
        .await?;

        Ok(paginator.page(number, comments))
    }
}
