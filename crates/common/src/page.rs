//! Numbered pagination for listing queries.

use serde::Serialize;

/// Fixed page size used by feed and tag listings.
pub const PAGE_SIZE: u64 = 20;

/// One page of results plus the metadata the boundary renders pagers from.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    /// Items on this page, already ordered.
    pub items: Vec<T>,
    /// 1-based page number this page represents.
    pub page: u64,
    /// Page size the query used.
    pub per_page: u64,
    /// Whether at least one more page exists after this one.
    pub has_next: bool,
}

impl<T> Page<T> {
    /// An empty page (used when the source set is empty, e.g. a feed for a
    /// user who follows nobody).
    #[must_use]
    pub const fn empty(page: u64, per_page: u64) -> Self {
        Self {
            items: Vec::new(),
            page,
            per_page,
            has_next: false,
        }
    }

    /// Build a page from an over-fetched item list.
    ///
    /// Queries fetch `per_page + 1` rows; the extra row only signals that a
    /// next page exists and is dropped here.
    #[must_use]
    pub fn from_overfetch(mut items: Vec<T>, page: u64, per_page: u64) -> Self {
        let has_next = items.len() as u64 > per_page;
        items.truncate(per_page as usize);
        Self {
            items,
            page,
            per_page,
            has_next,
        }
    }

    /// Normalize a caller-supplied page number to 1-based.
    #[must_use]
    pub const fn normalize(page: u64) -> u64 {
        if page == 0 { 1 } else { page }
    }

    /// Row offset for a 1-based page number.
    #[must_use]
    pub const fn offset(page: u64, per_page: u64) -> u64 {
        (Self::normalize(page) - 1) * per_page
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_overfetch_with_next() {
        let page = Page::from_overfetch(vec![1, 2, 3], 1, 2);
        assert_eq!(page.items, vec![1, 2]);
        assert!(page.has_next);
    }

    #[test]
    fn test_from_overfetch_last_page() {
        let page = Page::from_overfetch(vec![1, 2], 1, 2);
        assert_eq!(page.items, vec![1, 2]);
        assert!(!page.has_next);
    }

    #[test]
    fn test_empty() {
        let page: Page<u32> = Page::empty(3, PAGE_SIZE);
        assert!(page.items.is_empty());
        assert_eq!(page.page, 3);
        assert!(!page.has_next);
    }

    #[test]
    fn test_offset_normalizes_zero_page() {
        assert_eq!(Page::<u32>::offset(0, 20), 0);
        assert_eq!(Page::<u32>::offset(1, 20), 0);
        assert_eq!(Page::<u32>::offset(3, 20), 40);
    }
}
