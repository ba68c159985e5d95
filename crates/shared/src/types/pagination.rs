//! Pagination types for list endpoints.

use serde::{Deserialize, Serialize};

/// Largest page size a caller may request.
pub const MAX_LIMIT: u32 = 100;

/// Request parameters for paginated queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Page number (1-indexed).
    #[serde(default = "default_page")]
    pub page: u32,
    /// Number of items per page.
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    10
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: default_page(),
            limit: default_limit(),
        }
    }
}

impl PageRequest {
    /// Builds a request from optional query values, clamping to sane bounds.
    #[must_use]
    pub fn from_query(page: Option<u32>, limit: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or_else(default_page).max(1),
            limit: limit.unwrap_or_else(default_limit).clamp(1, MAX_LIMIT),
        }
    }

    /// Number of items to skip.
    #[must_use]
    pub fn offset(&self) -> usize {
        let page = self.page.max(1) - 1;
        (page as usize).saturating_mul(self.limit as usize)
    }

    /// Maximum number of items on this page.
    #[must_use]
    pub fn limit(&self) -> usize {
        self.limit as usize
    }
}

/// Response envelope for paginated data: `{count, results}`.
///
/// `count` is the total number of matches across all pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResponse<T> {
    /// Total number of matching items.
    pub count: u64,
    /// The items in the current page.
    pub results: Vec<T>,
}

impl<T> PageResponse<T> {
    /// Slices one page out of an already-filtered, ordered collection.
    #[must_use]
    pub fn paginate(items: Vec<T>, request: PageRequest) -> Self {
        let count = items.len() as u64;
        let results = items
            .into_iter()
            .skip(request.offset())
            .take(request.limit())
            .collect();
        Self { count, results }
    }

    /// Maps the page's items, keeping the count.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PageResponse<U> {
        PageResponse {
            count: self.count,
            results: self.results.into_iter().map(f).collect(),
        }
    }
}
