use serde::Serialize;

/// 分页器：根据总数和每页数量解析页码
///
/// Page numbers that are missing or not integers resolve to the first page.
/// Numbers below one or past the end resolve to the last page. An empty
/// listing still has one (empty) page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    count: usize,
    per_page: usize,
}

impl Paginator {
    pub fn new(count: usize, per_page: usize) -> Self {
        Self {
            count,
            per_page: per_page.max(1),
        }
    }

    pub fn num_pages(&self) -> usize {
        if self.count == 0 {
            1
        } else {
            (self.count + self.per_page - 1) / self.per_page
        }
    }

    /// 将请求中的 `page` 参数解析为有效页码
    pub fn resolve_page(&self, raw: Option<&str>) -> usize {
        let Some(number) = raw.and_then(parse_page_number) else {
            return 1;
        };

        if number < 1 || number as usize > self.num_pages() {
            self.num_pages()
        } else {
            number as usize
        }
    }

    /// 页码对应的 (offset, limit)
    pub fn bounds(&self, number: usize) -> (usize, usize) {
        let number = number.clamp(1, self.num_pages());
        ((number - 1) * self.per_page, self.per_page)
    }

    pub fn page<T>(&self, number: usize, object_list: Vec<T>) -> Page<T> {
        let number = number.clamp(1, self.num_pages());
        let num_pages = self.num_pages();
        let has_next = number < num_pages;
        let has_previous = number > 1;

        Page {
            object_list,
            number,
            num_pages,
            count: self.count,
            per_page: self.per_page,
            has_next,
            has_previous,
            has_other_pages: has_next || has_previous,
            next_page_number: has_next.then(|| number + 1),
            previous_page_number: has_previous.then(|| number - 1),
        }
    }
}

/// 解析 `page` 参数中的整数页码，不做范围校验
pub fn parse_page_number(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if let Ok(number) = raw.parse::<i64>() {
        return Some(number);
    }
    // "2.0" 之类的整数值浮点数同样接受
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() && value.fract() == 0.0 => Some(value as i64),
        _ => None,
    }
}

/// 一页数据及其分页元信息
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub object_list: Vec<T>,
    pub number: usize,
    pub num_pages: usize,
    pub count: usize,
    pub per_page: usize,
    pub has_next: bool,
    pub has_previous: bool,
    pub has_other_pages: bool,
    pub next_page_number: Option<usize>,
    pub previous_page_number: Option<usize>,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            object_list: self.object_list.into_iter().map(f).collect(),
            number: self.number,
            num_pages: self.num_pages,
            count: self.count,
            per_page: self.per_page,
            has_next: self.has_next,
            has_previous: self.has_previous,
            has_other_pages: self.has_other_pages,
            next_page_number: self.next_page_number,
            previous_page_number: self.previous_page_number,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_num_pages() {
        assert_eq!(Paginator::new(0, 10).num_pages(), 1);
        assert_eq!(Paginator::new(10, 10).num_pages(), 1);
        assert_eq!(Paginator::new(13, 10).num_pages(), 2);
        assert_eq!(Paginator::new(5, 0).num_pages(), 5);
    }

    #[test]
    fn test_resolve_page() {
        let paginator = Paginator::new(13, 10);
        assert_eq!(paginator.resolve_page(None), 1);
        assert_eq!(paginator.resolve_page(Some("abc")), 1);
        assert_eq!(paginator.resolve_page(Some("")), 1);
        assert_eq!(paginator.resolve_page(Some("2")), 2);
        assert_eq!(paginator.resolve_page(Some("2.0")), 2);
        assert_eq!(paginator.resolve_page(Some("1.5")), 1);
        assert_eq!(paginator.resolve_page(Some("99")), 2);
        assert_eq!(paginator.resolve_page(Some("0")), 2);
        assert_eq!(paginator.resolve_page(Some("-3")), 2);
    }

    #[test]
    fn test_page_metadata() {
        let paginator = Paginator::new(13, 10);
        let first = paginator.page(1, (1..=10).collect::<Vec<_>>());
        assert!(first.has_next);
        assert!(!first.has_previous);
        assert_eq!(first.next_page_number, Some(2));
        assert_eq!(first.object_list.len(), 10);

        let last = paginator.page(2, vec![11, 12, 13]);
        assert!(!last.has_next);
        assert_eq!(last.previous_page_number, Some(1));
        assert_eq!(last.object_list, vec![11, 12, 13]);
    }

    #[test]
    fn test_empty_listing_has_one_empty_page() {
        let paginator = Paginator::new(0, 10);
        assert_eq!(paginator.resolve_page(Some("5")), 1);
        let page = paginator.page::<i32>(1, Vec::new());
        assert!(page.object_list.is_empty());
        assert!(!page.has_other_pages);
        assert_eq!(page.num_pages, 1);
    }

    proptest! {
        #[test]
        fn resolved_page_is_always_in_range(count in 0usize..500, per_page in 1usize..50, raw in any::<i64>()) {
            let paginator = Paginator::new(count, per_page);
            let number = paginator.resolve_page(Some(&raw.to_string()));
            prop_assert!(number >= 1 && number <= paginator.num_pages());
        }

        #[test]
        fn page_bounds_cover_every_item_once(count in 0usize..500, per_page in 1usize..50) {
            let paginator = Paginator::new(count, per_page);
            let mut covered = 0;
            for number in 1..=paginator.num_pages() {
                let (offset, limit) = paginator.bounds(number);
                prop_assert_eq!(offset, covered);
                covered += limit.min(count.saturating_sub(offset));
            }
            prop_assert_eq!(covered, count);
        }
    }
}
