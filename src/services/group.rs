use crate::{
    error::{AppError, Result},
    models::group::*,
    services::Database,
    utils::slug::{generate_slug, is_valid_slug},
};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Clone)]
pub struct GroupService {
    db: Arc<Database>,
}

impl GroupService {
    pub async fn new(db: Arc<Database>) -> Result<Self> {
        Ok(Self { db })
    }

    /// 创建分组。slug 已存在时保留原分组并返回它
    pub async fn create(&self, title: &str, slug: Option<&str>, description: &str) -> Result<Group> {
        let slug = match slug {
            Some(slug) if !slug.trim().is_empty() => slug.trim().to_string(),
            _ => generate_slug(title),
        };

        if !is_valid_slug(&slug) {
            return Err(AppError::validation(&format!("Invalid slug: {}", slug)));
        }

        debug!("Creating group {} ({})", title, slug);

        let result = sqlx::query(
            "INSERT INTO post_groups (title, slug, description) VALUES (?, ?, ?) \
             ON CONFLICT (slug) DO NOTHING",
        )
        .bind(title)
        .bind(&slug)
        .bind(description)
        .execute(self.db.pool())
        .await?;

        if result.rows_affected() > 0 {
            info!("Created group {}", slug);
        }

        self.get_by_slug(&slug)
            .await?
            .ok_or_else(|| AppError::internal("Group vanished after insert"))
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Group>> {
        let group = sqlx::query_as::<_, Group>(
            "SELECT id, title, slug, description FROM post_groups WHERE slug = ?",
        )
        .bind(slug)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(group)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<Group>> {
        let group = sqlx::query_as::<_, Group>(
            "SELECT id, title, slug, description FROM post_groups WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(group)
    }

    /// 所有分组，按标题排序
    pub async fn list(&self) -> Result<Vec<Group>> {
        let groups = sqlx::query_as::<_, Group>(
            "SELECT id, title, slug, description FROM post_groups ORDER BY title, id",
        )
        .fetch_all(self.db.pool())
        .await?;

        Ok(groups)
    }

    /// 从 JSON 文件导入分组，返回处理的条目数
    pub async fn load_fixture(&self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        info!("Loading groups from {}", path.display());

        let raw = tokio::fs::read_to_string(path).await?;
        let fixtures: Vec<GroupFixture> = serde_json::from_str(&raw)
            .map_err(|e| AppError::BadRequest(format!("Invalid groups fixture: {}", e)))?;

        self.load_groups(&fixtures).await
    }

    pub async fn load_groups(&self, fixtures: &[GroupFixture]) -> Result<usize> {
        let mut loaded = 0;
        for fixture in fixtures {
            match self
                .create(&fixture.title, fixture.slug.as_deref(), &fixture.description)
                .await
            {
                Ok(_) => loaded += 1,
                Err(AppError::Validation(msg)) => warn!("Skipping group {}: {}", fixture.title, msg),
                Err(e) => return Err(e),
            }
        }
        Ok(loaded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    async fn service() -> GroupService {
        let db = Database::new(&Config::default()).await.unwrap();
        db.migrate().await.unwrap();
        GroupService::new(Arc::new(db)).await.unwrap()
    }

    #[tokio::test]
    async fn test_create_derives_slug_from_title() {
        let groups = service().await;

        let group = groups.create("Lev Tolstoy", None, "Fans").await.unwrap();
        assert_eq!(group.slug, "lev-tolstoy");

        let same = groups.create("Another title", Some("lev-tolstoy"), "").await.unwrap();
        assert_eq!(same.id, group.id);
        assert_eq!(same.title, "Lev Tolstoy");
    }

    #[tokio::test]
    async fn test_invalid_slug_is_rejected() {
        let groups = service().await;

        let result = groups.create("Cats", Some("no spaces allowed"), "").await;
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert!(groups.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_load_fixture_file() {
        let groups = service().await;
        let path = std::env::temp_dir().join(format!("yatube-groups-{}.json", uuid::Uuid::new_v4()));
        tokio::fs::write(
            &path,
            r#"[
                {"title": "Dogs", "slug": "dogs", "description": "Woof"},
                {"title": "Cats"},
                {"title": "Broken", "slug": "bad slug"}
            ]"#,
        )
        .await
        .unwrap();

        let loaded = groups.load_fixture(&path).await.unwrap();
        tokio::fs::remove_file(&path).await.unwrap();

        assert_eq!(loaded, 2);
        let titles: Vec<String> = groups.list().await.unwrap().into_iter().map(|g| g.title).collect();
        assert_eq!(titles, vec!["Cats", "Dogs"]);
        assert_eq!(groups.get_by_slug("cats").await.unwrap().unwrap().description, "");
    }
}
