use crate::{
    config::Config,
    error::Result,
    services::{
        AuthService, CommentService, Database, FollowService, GroupService, MediaService,
        PostService, UserService,
    },
    utils::cache::PageCache,
};
use std::sync::Arc;
use std::time::Duration;

/// 应用程序的共享状态
/// 包含所有服务和配置的引用
#[derive(Clone)]
pub struct AppState {
    /// 应用配置
    pub config: Config,

    /// 数据库连接
    pub db: Arc<Database>,

    /// 认证服务
    pub auth_service: AuthService,

    /// 用户服务
    pub user_service: UserService,

    /// 分组服务
    pub group_service: GroupService,

    /// 帖子服务
    pub post_service: PostService,

    /// 评论服务
    pub comment_service: CommentService,

    /// 关注服务
    pub follow_service: FollowService,

    /// 媒体服务
    pub media_service: MediaService,

    /// 首页帖子列表片段缓存
    pub index_cache: PageCache,
}

impl AppState {
    /// 连接数据库、执行迁移并初始化所有服务
    pub async fn new(config: Config) -> Result<Self> {
        let db = Arc::new(Database::new(&config).await?);
        db.verify_connection().await?;
        db.migrate().await?;

        let auth_service = AuthService::new(&config).await?;
        let user_service = UserService::new(db.clone(), auth_service.clone()).await?;
        let group_service = GroupService::new(db.clone()).await?;
        let post_service = PostService::new(db.clone()).await?;
        let comment_service = CommentService::new(db.clone()).await?;
        let follow_service = FollowService::new(db.clone()).await?;
        let media_service = MediaService::new(&config).await?;
        let index_cache = PageCache::new(Duration::from_secs(config.index_cache_ttl));

        Ok(Self {
            config,
            db,
            auth_service,
            user_service,
            group_service,
            post_service,
            comment_service,
            follow_service,
            media_service,
            index_cache,
        })
    }

    /// 获取分页配置
    pub fn get_page_size(&self, resource_type: &str) -> usize {
        match resource_type {
            "posts" => self.config.posts_per_page,
            "comments" => self.config.comments_per_page,
            _ => 10,
        }
    }

    /// 检查是否为生产环境
    pub fn is_production(&self) -> bool {
        self.config.is_production()
    }
}
