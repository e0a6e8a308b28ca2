use serde::{Deserialize, Serialize};
use std::env;

const DEV_JWT_SECRET: &str = "yatube-development-secret";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Server configuration
    pub server_host: String,
    pub server_port: u16,
    pub environment: String,
    pub log_level: String,

    // Database configuration
    pub database_url: String,
    pub database_max_connections: u32,

    // Session configuration
    pub jwt_secret: String,
    pub session_ttl_hours: i64,
    pub session_cookie_name: String,

    // Content settings
    pub posts_per_page: usize,
    pub comments_per_page: usize,
    pub index_cache_ttl: u64,

    // Media configuration
    pub media_root: String,
    pub max_upload_size: usize,
    pub allowed_image_types: String,

    // Seed data
    pub groups_fixture: Option<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(secret) => secret,
            Err(_) if environment == "production" => {
                anyhow::bail!("JWT_SECRET must be set in production")
            }
            Err(_) => DEV_JWT_SECRET.to_string(),
        };

        Ok(Config {
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse()?,
            environment,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),

            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://yatube.db".to_string()),
            database_max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()?,

            jwt_secret,
            session_ttl_hours: env::var("SESSION_TTL_HOURS")
                .unwrap_or_else(|_| "336".to_string())
                .parse()?,
            session_cookie_name: env::var("SESSION_COOKIE_NAME")
                .unwrap_or_else(|_| "yatube_session".to_string()),

            posts_per_page: env::var("POSTS_PER_PAGE")
                .unwrap_or_else(|_| "10".to_string())
                .parse()?,
            comments_per_page: env::var("COMMENTS_PER_PAGE")
                .unwrap_or_else(|_| "10".to_string())
                .parse()?,
            index_cache_ttl: env::var("INDEX_CACHE_TTL")
                .unwrap_or_else(|_| "20".to_string())
                .parse()?,

            media_root: env::var("MEDIA_ROOT").unwrap_or_else(|_| "media".to_string()),
            max_upload_size: env::var("MAX_UPLOAD_SIZE")
                .unwrap_or_else(|_| "5242880".to_string())
                .parse()?,
            allowed_image_types: env::var("ALLOWED_IMAGE_TYPES")
                .unwrap_or_else(|_| "jpeg,jpg,png,gif,webp".to_string()),

            groups_fixture: env::var("GROUPS_FIXTURE").ok().filter(|path| !path.is_empty()),
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    pub fn is_in_memory_database(&self) -> bool {
        self.database_url.contains(":memory:") || self.database_url.contains("mode=memory")
    }

    /// 允许上传的图片扩展名列表
    pub fn allowed_image_extensions(&self) -> Vec<String> {
        self.allowed_image_types
            .split(',')
            .map(|ext| ext.trim().to_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect()
    }
}

impl Default for Config {
    /// 内存数据库配置，供测试使用
    fn default() -> Self {
        Self {
            server_host: "127.0.0.1".to_string(),
            server_port: 8000,
            environment: "test".to_string(),
            log_level: "debug".to_string(),
            database_url: "sqlite::memory:".to_string(),
            database_max_connections: 1,
            jwt_secret: DEV_JWT_SECRET.to_string(),
            session_ttl_hours: 336,
            session_cookie_name: "yatube_session".to_string(),
            posts_per_page: 10,
            comments_per_page: 10,
            index_cache_ttl: 20,
            media_root: env::temp_dir()
                .join("yatube-test-media")
                .to_string_lossy()
                .into_owned(),
            max_upload_size: 5 * 1024 * 1024,
            allowed_image_types: "jpeg,jpg,png,gif,webp".to_string(),
            groups_fixture: None,
        }
    }
}
