use dashmap::DashMap;
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};
use tracing::debug;

use crate::utils::pagination::parse_page_number;

/// 后台清理间隔的上下限，实际间隔取默认 TTL
const MIN_SWEEP_INTERVAL: Duration = Duration::from_secs(1);
const MAX_SWEEP_INTERVAL: Duration = Duration::from_secs(300);

/// 缓存项
#[derive(Debug, Clone)]
struct CacheItem<T> {
    value: T,
    expires_at: Instant,
}

/// 带过期时间的内存缓存
#[derive(Debug, Clone)]
pub struct Cache<T: Clone + Send + Sync> {
    data: Arc<DashMap<String, CacheItem<T>>>,
    default_ttl: Duration,
}

/// 渲染好的页面片段缓存
pub type PageCache = Cache<String>;

impl<T: Clone + Send + Sync + 'static> Cache<T> {
    /// 创建新的缓存实例。在 tokio 运行时内会启动后台清理任务
    pub fn new(default_ttl: Duration) -> Self {
        let cache = Self {
            data: Arc::new(DashMap::new()),
            default_ttl,
        };

        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let data_ref = Arc::downgrade(&cache.data);
            handle.spawn(Self::sweep(data_ref, sweep_interval(default_ttl)));
        }

        cache
    }

    /// 设置缓存项
    pub fn set(&self, key: impl Into<String>, value: T) {
        let item = CacheItem {
            value,
            expires_at: Instant::now() + self.default_ttl,
        };
        self.data.insert(key.into(), item);
    }

    /// 获取缓存项，过期项视为不存在
    pub fn get(&self, key: &str) -> Option<T> {
        let now = Instant::now();
        let hit = self
            .data
            .get(key)
            .filter(|item| item.expires_at > now)
            .map(|item| item.value.clone());

        if hit.is_none() {
            self.data.remove_if(key, |_, item| item.expires_at <= now);
        }
        hit
    }

    /// 清空所有缓存
    pub fn clear(&self) {
        self.data.clear();
    }

    fn purge(data: &DashMap<String, CacheItem<T>>) -> usize {
        let now = Instant::now();
        let before = data.len();
        data.retain(|_, item| item.expires_at > now);
        before.saturating_sub(data.len())
    }

    async fn sweep(data: Weak<DashMap<String, CacheItem<T>>>, every: Duration) {
        let mut interval = tokio::time::interval(every);
        interval.tick().await;
        loop {
            interval.tick().await;
            let Some(data) = data.upgrade() else {
                break;
            };
            let removed = Self::purge(&data);
            if removed > 0 {
                debug!("Swept {} expired cache entries", removed);
            }
        }
    }
}

fn sweep_interval(ttl: Duration) -> Duration {
    ttl.clamp(MIN_SWEEP_INTERVAL, MAX_SWEEP_INTERVAL)
}

/// 首页帖子列表片段的缓存键
///
/// 页码先规范化，`abc`、`1.0` 和 `1` 共用同一项。小于 1 的页码都指向最后一页
pub fn index_page_key(page: Option<&str>) -> String {
    match page.and_then(parse_page_number) {
        Some(number) if number < 1 => "index_page:last".to_string(),
        Some(number) => format!("index_page:{}", number),
        None => "index_page:1".to_string(),
    }
}
