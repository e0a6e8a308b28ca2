use once_cell::sync::Lazy;
use regex::Regex;

static SLUG_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[-a-zA-Z0-9_]+$").unwrap());

pub const SLUG_MAX_LENGTH: usize = 200;

/// 从标题生成 URL 友好的 slug
pub fn generate_slug(title: &str) -> String {
    let mut slug = ::slug::slugify(title);

    if slug.len() > SLUG_MAX_LENGTH {
        slug.truncate(SLUG_MAX_LENGTH);
        slug = slug.trim_end_matches('-').to_string();
    }

    if slug.is_empty() {
        slug = "group".to_string();
    }

    slug
}

/// 校验 slug：只包含字母、数字、下划线和连字符
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty() && slug.len() <= SLUG_MAX_LENGTH && SLUG_REGEX.is_match(slug)
}
