//! Page/limit pagination shared by every list endpoint.

use serde::{Deserialize, Serialize};

/// Pagination parameters as received from a query string.
///
/// Out-of-range values are clamped rather than rejected so that a stale
/// frontend link never turns into an error page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Pagination {
    #[serde(default = "Pagination::default_page")]
    page: u32,
    #[serde(default = "Pagination::default_limit")]
    limit: u32,
}

impl Pagination {
    /// Default page size.
    pub const DEFAULT_LIMIT: u32 = 20;
    /// Largest page size a client may request.
    pub const MAX_LIMIT: u32 = 100;

    /// Create clamped pagination parameters.
    #[must_use]
    pub fn new(page: u32, limit: u32) -> Self {
        Self { page, limit }.clamped()
    }

    const fn default_page() -> u32 {
        1
    }

    const fn default_limit() -> u32 {
        Self::DEFAULT_LIMIT
    }

    #[must_use]
    fn clamped(self) -> Self {
        Self {
            page: self.page.max(1),
            limit: self.limit.clamp(1, Self::MAX_LIMIT),
        }
    }

    /// 1-based page number.
    #[must_use]
    pub fn page(&self) -> u32 {
        self.clamped().page
    }

    /// Page size.
    #[must_use]
    pub fn limit(&self) -> u32 {
        self.clamped().limit
    }

    /// Row offset for SQL `OFFSET`.
    #[must_use]
    pub fn offset(&self) -> i64 {
        i64::from(self.page() - 1) * i64::from(self.limit())
    }

    /// Page size for SQL `LIMIT`.
    #[must_use]
    pub fn sql_limit(&self) -> i64 {
        i64::from(self.limit())
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(1, Self::DEFAULT_LIMIT)
    }
}

/// A page of results plus the numbers the frontend needs for paging controls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub total_pages: i64,
}

impl<T> Page<T> {
    /// Assemble a page from query results.
    #[must_use]
    pub fn new(items: Vec<T>, pagination: Pagination, total: i64) -> Self {
        let limit = i64::from(pagination.limit());
        let total = total.max(0);
        Self {
            items,
            page: pagination.page(),
            limit: pagination.limit(),
            total,
            total_pages: (total + limit - 1) / limit,
        }
    }

    /// Transform the items, keeping the paging numbers.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            limit: self.limit,
            total: self.total,
            total_pages: self.total_pages,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_query() {
        let p: Pagination = serde_json::from_str("{}").unwrap();
        assert_eq!(p.page(), 1);
        assert_eq!(p.limit(), Pagination::DEFAULT_LIMIT);
        assert_eq!(p.offset(), 0);
    }

    #[test]
    fn test_clamps_out_of_range() {
        let p: Pagination = serde_json::from_str(r#"{"page":0,"limit":5000}"#).unwrap();
        assert_eq!(p.page(), 1);
        assert_eq!(p.limit(), Pagination::MAX_LIMIT);

        assert_eq!(Pagination::new(3, 0).limit(), 1);
    }

    #[test]
    fn test_offset() {
        assert_eq!(Pagination::new(3, 25).offset(), 50);
    }

    #[test]
    fn test_total_pages_rounds_up() {
        let page = Page::new(vec![1, 2], Pagination::new(1, 10), 21);
        assert_eq!(page.total_pages, 3);

        let empty: Page<i32> = Page::new(vec![], Pagination::default(), 0);
        assert_eq!(empty.total_pages, 0);
    }
}
