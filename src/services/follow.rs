use crate::{
    error::Result,
    models::follow::*,
    services::Database,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Clone)]
pub struct FollowService {
    db: Arc<Database>,
}

impl FollowService {
    pub async fn new(db: Arc<Database>) -> Result<Self> {
        Ok(Self { db })
    }

    /// 关注作者，返回已有或新建的关注关系。关注自己被忽略，返回 None
    pub async fn follow(&self, user_id: i64, author_id: i64) -> Result<Option<Follow>> {
        debug!("User {} following author {}", user_id, author_id);

        if user_id == author_id {
            debug!("User {} tried to follow themselves", user_id);
            return Ok(None);
        }

        let result = sqlx::query(
            "INSERT INTO follows (user_id, author_id, pub_date) VALUES (?, ?, ?) \
             ON CONFLICT (user_id, author_id) DO NOTHING",
        )
        .bind(user_id)
        .bind(author_id)
        .bind(Utc::now())
        .execute(self.db.pool())
        .await?;

        if result.rows_affected() > 0 {
            info!("User {} followed author {}", user_id, author_id);
        }
        self.get(user_id, author_id).await
    }

    /// 取消关注，返回是否删除了关系
    pub async fn unfollow(&self, user_id: i64, author_id: i64) -> Result<bool> {
        debug!("User {} unfollowing author {}", user_id, author_id);

        let result = sqlx::query("DELETE FROM follows WHERE user_id = ? AND author_id = ?")
            .bind(user_id)
            .bind(author_id)
            .execute(self.db.pool())
            .await?;

        let removed = result.rows_affected() > 0;
        if removed {
            info!("User {} unfollowed author {}", user_id, author_id);
        }
        Ok(removed)
    }

    pub async fn is_following(&self, user_id: i64, author_id: i64) -> Result<bool> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM follows WHERE user_id = ? AND author_id = ?",
        )
        .bind(user_id)
        .bind(author_id)
        .fetch_one(self.db.pool())
        .await?;

        Ok(count > 0)
    }

    pub async fn get(&self, user_id: i64, author_id: i64) -> Result<Option<Follow>> {
        let follow = sqlx::query_as::<_, Follow>(
            "SELECT id, user_id, author_id, pub_date FROM follows WHERE user_id = ? AND author_id = ?",
        )
        .bind(user_id)
        .bind(author_id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(follow)
    }

    /// 关注关系总数
    pub async fn count(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM follows")
            .fetch_one(self.db.pool())
            .await?;

        Ok(count)
    }
}
