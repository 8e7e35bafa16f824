//! Offset pagination for account listings.
//!
//! Requests are clamped rather than rejected: page 0 reads as page 1 and
//! `per_page` is held within `1..=MAX_PER_PAGE`.

use serde::{Deserialize, Serialize};

/// Largest page a caller may ask for.
pub const MAX_PER_PAGE: u32 = 100;

const DEFAULT_PER_PAGE: u32 = 20;

/// A 1-indexed page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageRequest {
    /// Page number, starting at 1.
    pub page: u32,
    /// Items per page.
    pub per_page: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl PageRequest {
    /// Creates a clamped page request.
    #[must_use]
    pub fn new(page: u32, per_page: u32) -> Self {
        Self { page, per_page }.clamped()
    }

    /// The same request with page and size forced into range.
    #[must_use]
    pub fn clamped(self) -> Self {
        Self {
            page: self.page.max(1),
            per_page: self.per_page.clamp(1, MAX_PER_PAGE),
        }
    }

    /// Rows to skip.
    #[must_use]
    pub fn offset(&self) -> u64 {
        let page = self.clamped();
        u64::from(page.page - 1) * u64::from(page.per_page)
    }

    /// Rows to take.
    #[must_use]
    pub fn limit(&self) -> u64 {
        u64::from(self.clamped().per_page)
    }
}

/// One page of results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResponse<T> {
    /// Items on this page.
    pub data: Vec<T>,
    /// Position within the full result set.
    pub meta: PageMeta,
}

/// Where a page sits in the full result set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    /// Current page.
    pub page: u32,
    /// Items per page.
    pub per_page: u32,
    /// Items across all pages.
    pub total: u64,
    /// Number of pages; at least 1.
    pub total_pages: u32,
    /// Whether a later page exists.
    pub has_next: bool,
}

impl<T> PageResponse<T> {
    /// Wraps `data` fetched for `request` out of `total` rows.
    #[must_use]
    pub fn for_request(data: Vec<T>, request: PageRequest, total: u64) -> Self {
        let PageRequest { page, per_page } = request.clamped();
        let total_pages = u32::try_from(total.div_ceil(u64::from(per_page)))
            .unwrap_or(u32::MAX)
            .max(1);

        Self {
            data,
            meta: PageMeta {
                page,
                per_page,
                total,
                total_pages,
                has_next: page < total_pages,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1, 20, 0)]
    #[case(2, 20, 20)]
    #[case(3, 10, 20)]
    #[case(0, 10, 0)]
    #[case(2, 500, 100)]
    fn test_offset(#[case] page: u32, #[case] per_page: u32, #[case] expected: u64) {
        assert_eq!(PageRequest::new(page, per_page).offset(), expected);
    }

    #[test]
    fn test_per_page_is_clamped() {
        assert_eq!(PageRequest::new(1, 0).limit(), 1);
        assert_eq!(PageRequest::new(1, 1_000).limit(), u64::from(MAX_PER_PAGE));
    }

    #[rstest]
    #[case(0, 20, 1, 1, false)]
    #[case(20, 20, 1, 1, false)]
    #[case(21, 20, 1, 2, true)]
    #[case(45, 10, 5, 5, false)]
    #[case(45, 10, 4, 5, true)]
    fn test_meta(
        #[case] total: u64,
        #[case] per_page: u32,
        #[case] page: u32,
        #[case] total_pages: u32,
        #[case] has_next: bool,
    ) {
        let response = PageResponse::<u8>::for_request(vec![], PageRequest::new(page, per_page), total);
        assert_eq!(response.meta.total_pages, total_pages);
        assert_eq!(response.meta.has_next, has_next);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let request: PageRequest = serde_json::from_str(r#"{"page": 3}"#).unwrap();
        assert_eq!(request, PageRequest { page: 3, per_page: 20 });
    }
}
