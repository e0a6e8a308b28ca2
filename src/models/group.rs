use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Group {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
}

/// 初始分组数据文件中的一项
#[derive(Debug, Clone, Deserialize)]
pub struct GroupFixture {
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: String,
}

/// 帖子表单中的分组选项
#[derive(Debug, Clone, Serialize)]
pub struct GroupChoice {
    pub id: i64,
    pub title: String,
    pub selected: bool,
}

impl GroupChoice {
    pub fn list(groups: &[Group], selected: Option<i64>) -> Vec<Self> {
        groups
            .iter()
            .map(|group| Self {
                id: group.id,
                title: group.title.clone(),
                selected: selected == Some(group.id),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_slug_is_optional() {
        let fixtures: Vec<GroupFixture> =
            serde_json::from_str(r#"[{"title": "Cats", "description": "About cats"}, {"title": "Dogs", "slug": "dogs"}]"#)
                .unwrap();
        assert_eq!(fixtures[0].slug, None);
        assert_eq!(fixtures[1].slug.as_deref(), Some("dogs"));
        assert_eq!(fixtures[1].description, "");
    }

    #[test]
    fn test_group_choices_mark_selected() {
        let groups = vec![
            Group { id: 1, title: "A".into(), slug: "a".into(), description: String::new() },
            Group { id: 2, title: "B".into(), slug: "b".into(), description: String::new() },
        ];
        let choices = GroupChoice::list(&groups, Some(2));
        assert!(!choices[0].selected);
        assert!(choices[1].selected);
    }
}
