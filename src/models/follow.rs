use chrono::{DateTime, Utc};
use serde::Serialize;

/// 关注关系：user 关注 author
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Follow {
    pub id: i64,
    pub user_id: i64,
    pub author_id: i64,
    pub pub_date: DateTime<Utc>,
}
