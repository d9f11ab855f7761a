//! Page-number pagination for list endpoints.

use serde::{Deserialize, Serialize};

/// Upper bound on `size` accepted from clients
pub const MAX_PAGE_SIZE: i64 = 100;

/// Upper bound on `page`, keeping `page * size` within `i64`
pub const MAX_PAGE: i64 = i64::MAX / MAX_PAGE_SIZE - 1;

/// Query parameters `?page=&size=`
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<i64>,
    pub size: Option<i64>,
}

impl PageParams {
    pub fn new(page: i64, size: i64) -> Self {
        Self {
            page: Some(page),
            size: Some(size),
        }
    }

    /// Clamps the request into a valid window using `default_size` when unset
    pub fn resolve(&self, default_size: i64) -> Pagination {
        let page = self.page.unwrap_or(1).clamp(1, MAX_PAGE);
        let size = self
            .size
            .unwrap_or(default_size)
            .clamp(1, MAX_PAGE_SIZE);
        Pagination { page, size }
    }
}

/// A resolved page window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub size: i64,
}

impl Pagination {
    pub fn limit(&self) -> i64 {
        self.size
    }

    pub fn offset(&self) -> i64 {
        self.page.saturating_sub(1).saturating_mul(self.size)
    }
}

/// A page of results with navigation metadata
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Page<T> {
    pub count: i64,
    pub items: Vec<T>,
    pub next_page: Option<i64>,
    pub previous_page: Option<i64>,
    pub total_pages: i64,
    pub per_page: i64,
    pub current_page: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, count: i64, window: Pagination) -> Self {
        let Pagination { page, size } = window;
        Self {
            count,
            items,
            next_page: (page.saturating_mul(size) < count).then(|| page.saturating_add(1)),
            previous_page: (page > 1).then_some(page - 1),
            total_pages: (count + size - 1) / size,
            per_page: size,
            current_page: page,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            count: self.count,
            items: self.items.into_iter().map(f).collect(),
            next_page: self.next_page,
            previous_page: self.previous_page,
            total_pages: self.total_pages,
            per_page: self.per_page,
            current_page: self.current_page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_defaults_and_clamps() {
        assert_eq!(
            PageParams::default().resolve(10),
            Pagination { page: 1, size: 10 }
        );
        assert_eq!(
            PageParams::new(0, 1000).resolve(10),
            Pagination { page: 1, size: MAX_PAGE_SIZE }
        );
        assert_eq!(PageParams::new(3, 0).resolve(10).size, 1);
        assert_eq!(PageParams::new(3, 20).resolve(10).offset(), 40);
    }

    #[test]
    fn test_huge_page_is_capped() {
        let window = PageParams::new(i64::MAX, 10).resolve(10);
        assert_eq!(window.page, MAX_PAGE);
        assert!(window.offset() > 0);

        let page: Page<i32> = Page::new(vec![], 5, window);
        assert_eq!(page.next_page, None);
        assert_eq!(page.previous_page, Some(MAX_PAGE - 1));
    }

    #[test]
    fn test_hand_built_window_does_not_overflow() {
        let window = Pagination { page: i64::MAX, size: MAX_PAGE_SIZE };
        assert_eq!(window.offset(), i64::MAX);

        let page: Page<i32> = Page::new(vec![], 5, window);
        assert_eq!(page.next_page, None);
    }

    #[test]
    fn test_first_of_several_pages() {
        let page = Page::new(vec![1, 2, 3], 25, Pagination { page: 1, size: 10 });
        assert_eq!(page.next_page, Some(2));
        assert_eq!(page.previous_page, None);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.per_page, 10);
    }

    #[test]
    fn test_last_page_has_no_next() {
        let page: Page<i32> = Page::new(vec![], 25, Pagination { page: 3, size: 10 });
        assert_eq!(page.next_page, None);
        assert_eq!(page.previous_page, Some(2));
    }

    #[test]
    fn test_exact_multiple() {
        let page: Page<i32> = Page::new(vec![], 20, Pagination { page: 2, size: 10 });
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.next_page, None);
    }

    #[test]
    fn test_empty_result() {
        let page: Page<i32> = Page::new(vec![], 0, Pagination { page: 1, size: 10 });
        assert_eq!(page.total_pages, 0);
        assert_eq!(page.next_page, None);
        assert_eq!(page.previous_page, None);
    }

    #[test]
    fn test_map_keeps_metadata() {
        let page = Page::new(vec![1, 2], 12, Pagination { page: 1, size: 2 });
        let mapped = page.map(|n| n.to_string());
        assert_eq!(mapped.items, vec!["1".to_string(), "2".to_string()]);
        assert_eq!(mapped.total_pages, 6);
    }
}
