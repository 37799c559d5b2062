//! Pagination value objects.
//!
//! Pages are 1-indexed; `skip = (page - 1) * limit`. The `total` on a
//! returned page is an independent count of all matching records, not just
//! the returned slice.

use serde::{Deserialize, Serialize};

/// Default page size when the caller does not supply one.
pub const DEFAULT_PAGE_LIMIT: u32 = 10;

/// A validated pagination request.
///
/// Construction coerces out-of-range input: `page` below 1 becomes 1 and
/// `limit` of 0 falls back to [`DEFAULT_PAGE_LIMIT`]. Callers that enforce
/// an upper bound apply [`PageRequest::capped`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    page: u32,
    limit: u32,
}

impl PageRequest {
    /// Creates a request, coercing `page` to at least 1 and an empty
    /// `limit` to the default.
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: page.max(1),
            limit: if limit == 0 { DEFAULT_PAGE_LIMIT } else { limit },
        }
    }

    /// Returns a copy with `limit` bounded by `cap`.
    pub fn capped(self, cap: u32) -> Self {
        Self {
            page: self.page,
            limit: self.limit.min(cap.max(1)),
        }
    }

    /// The 1-indexed page number.
    pub fn page(&self) -> u32 {
        self.page
    }

    /// The page size.
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Number of records to skip before this page.
    pub fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.limit as u64
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, DEFAULT_PAGE_LIMIT)
    }
}

/// One page of results plus the total count of all matching records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    /// Records in this page, at most `limit` of them.
    pub data: Vec<T>,

    /// Total matching records across all pages.
    pub total: u64,
}

impl<T> Page<T> {
    /// Creates a page from its slice and independent total.
    pub fn new(data: Vec<T>, total: u64) -> Self {
        Self { data, total }
    }

    /// Whether records exist beyond this request's window.
    pub fn has_more(&self, request: &PageRequest) -> bool {
        request.offset() + (self.data.len() as u64) < self.total
    }
}
