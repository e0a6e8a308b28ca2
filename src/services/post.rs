use crate::{
    error::{AppError, Result},
    models::post::*,
    services::Database,
    utils::{
        pagination::{Page, Paginator},
        validation::single_error,
    },
};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};

const POST_VIEW_SELECT: &str = r#"
    SELECT
        p.id,
        p.text,
        p.pub_date,
        p.author_id,
        u.username AS author_username,
        TRIM(u.first_name || ' ' || u.last_name) AS author_full_name,
        p.group_id,
        g.title AS group_title,
        g.slug AS group_slug,
        p.image
    FROM posts p
    JOIN users u ON u.id = p.author_id
    LEFT JOIN post_groups g ON g.id = p.group_id
"#;

const NEWEST_FIRST: &str = "ORDER BY p.pub_date DESC, p.id DESC";

/// 帖子列表的筛选条件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostFilter {
    All,
    Group(i64),
    Author(i64),
    /// 该用户关注的作者发布的帖子
    FollowedBy(i64),
}

impl PostFilter {
    fn where_clause(&self) -> (&'static str, Option<i64>) {
        match self {
            PostFilter::All => ("", None),
            PostFilter::Group(id) => ("WHERE p.group_id = ?", Some(*id)),
            PostFilter::Author(id) => ("WHERE p.author_id = ?", Some(*id)),
            PostFilter::FollowedBy(id) => (
                "WHERE p.author_id IN (SELECT f.author_id FROM follows f WHERE f.user_id = ?)",
                Some(*id),
            ),
        }
    }
}

#[derive(Clone)]
pub struct PostService {
    db: Arc<Database>,
}

impl PostService {
    pub async fn new(db: Arc<Database>) -> Result<Self> {
        Ok(Self { db })
    }

    /// 分组必须存在，否则作为表单字段错误返回
    pub async fn ensure_group(&self, group_id: Option<i64>) -> Result<()> {
        let Some(group_id) = group_id else {
            return Ok(());
        };

        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM post_groups WHERE id = ?")
            .bind(group_id)
            .fetch_one(self.db.pool())
            .await?;

        if count == 0 {
            return Err(AppError::ValidatorError(single_error(
                "group",
                "invalid_choice",
                "Select a valid choice. That choice is not one of the available choices.",
            )));
        }
        Ok(())
    }

    /// 创建帖子
    pub async fn create(&self, author_id: i64, form: &PostForm, image: Option<String>) -> Result<Post> {
        debug!("Creating post for author: {}", author_id);

        let id = sqlx::query(
            "INSERT INTO posts (text, pub_date, author_id, group_id, image) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&form.text)
        .bind(Utc::now())
        .bind(author_id)
        .bind(form.group)
        .bind(image)
        .execute(self.db.pool())
        .await?
        .last_insert_rowid();

        info!("Post {} created by author {}", id, author_id);
        self.get_required(id).await
    }

    /// 更新帖子文本和分组。未上传新图片时保留原图
    pub async fn update(&self, post_id: i64, form: &PostForm, image: Option<String>) -> Result<Post> {
        debug!("Updating post: {}", post_id);

        let result = sqlx::query(
            "UPDATE posts SET text = ?, group_id = ?, image = COALESCE(?, image) WHERE id = ?",
        )
        .bind(&form.text)
        .bind(form.group)
        .bind(image)
        .bind(post_id)
        .execute(self.db.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Post"));
        }

        info!("Post {} updated", post_id);
        self.get_required(post_id).await
    }

    pub async fn delete(&self, post_id: i64) -> Result<()> {
        debug!("Deleting post: {}", post_id);

        let result = sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(post_id)
            .execute(self.db.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Post"));
        }

        info!("Post {} deleted", post_id);
        Ok(())
    }

    pub async fn get(&self, post_id: i64) -> Result<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(
            "SELECT id, text, pub_date, author_id, group_id, image FROM posts WHERE id = ?",
        )
        .bind(post_id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(post)
    }

    pub async fn get_required(&self, post_id: i64) -> Result<Post> {
        self.get(post_id)
            .await?
            .ok_or_else(|| AppError::not_found("Post"))
    }

    /// 带作者与分组信息的帖子
    pub async fn get_view(&self, post_id: i64) -> Result<Option<PostView>> {
        let post = sqlx::query_as::<_, PostView>(&format!("{} WHERE p.id = ?", POST_VIEW_SELECT))
            .bind(post_id)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(post)
    }

    pub async fn count(&self, filter: PostFilter) -> Result<i64> {
        let (clause, param) = filter.where_clause();
        let sql = format!("SELECT COUNT(*) FROM posts p {}", clause);

        let mut query = sqlx::query_scalar::<_, i64>(&sql);
        if let Some(param) = param {
            query = query.bind(param);
        }

        Ok(query.fetch_one(self.db.pool()).await?)
    }

    pub async fn count_by_author(&self, author_id: i64) -> Result<i64> {
        self.count(PostFilter::Author(author_id)).await
    }

    /// 按筛选条件分页获取帖子，最新的在前
    pub async fn list(
        &self,
        filter: PostFilter,
        page: Option<&str>,
        per_page: usize,
    ) -> Result<Page<PostView>> {
        debug!("Listing posts: {:?}, page {:?}", filter, page);

        let count = self.count(filter).await?;
        let paginator = Paginator::new(count as usize, per_page);
        let number = paginator.resolve_page(page);
        let (offset, limit) = paginator.bounds(number);

        let (clause, param) = filter.where_clause();
        let sql = format!(
            "{} {} {} LIMIT ? OFFSET ?",
            POST_VIEW_SELECT, clause, NEWEST_FIRST
        );

        let mut query = sqlx::query_as::<_, PostView>(&sql);
        if let Some(param) = param {
            query = query.bind(param);
        }
        let posts = query
            .bind(limit as i64)
            .bind(offset as i64)
            .fetch_all(self.db.pool())
            .await?;

        Ok(paginator.page(number, posts))
    }
}
