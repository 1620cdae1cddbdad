//! # Pagination
//!
//! Deterministic page/limit windowing over an ordered sequence, and the
//! canonical result envelope.
//!
//! One envelope shape is used everywhere in the platform:
//! `{ items, pagination: { page, limit, total, total_pages, has_next,
//! has_prev } }`.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Default page size when the caller does not supply one.
pub const DEFAULT_LIMIT: u32 = 20;

/// Upper bound on page size; larger requests are clamped, not rejected.
pub const MAX_LIMIT: u32 = 100;

/// A validated page request. `page` is 1-indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    limit: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PageRequest {
    /// Build a request, clamping `page` to at least 1 and `limit` into
    /// `[1, MAX_LIMIT]`.
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: page.max(1),
            limit: limit.clamp(1, MAX_LIMIT),
        }
    }

    /// Parse raw `page`/`limit` parameters. Absent or malformed values
    /// take the defaults; out-of-range values are clamped.
    pub fn from_params(page: Option<&str>, limit: Option<&str>) -> Self {
        let page = page.and_then(|p| p.trim().parse().ok()).unwrap_or(1);
        let limit = limit
            .and_then(|l| l.trim().parse().ok())
            .unwrap_or(DEFAULT_LIMIT);
        Self::new(page, limit)
    }

    /// The 1-indexed page number.
    pub fn page(&self) -> u32 {
        self.page
    }

    /// The page size.
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Number of records to skip before this page starts.
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }
}

/// Aggregate pagination metadata for a result envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    /// Count over the fully-filtered, pre-pagination set.
    pub total: u64,
    pub total_pages: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl Pagination {
    /// Compute metadata for `total` matching records under `request`.
    pub fn compute(total: u64, request: PageRequest) -> Self {
        let limit = u64::from(request.limit());
        let total_pages = total.div_ceil(limit);
        let page = request.page();
        Self {
            page,
            limit: request.limit(),
            total,
            total_pages,
            has_next: u64::from(page) < total_pages,
            has_prev: page > 1,
        }
    }
}

/// The canonical paginated result envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

/// Slice one page out of an ordered sequence.
///
/// A `page` beyond the last page yields an empty slice, never an error.
pub fn window<T: Clone>(items: &[T], request: PageRequest) -> Vec<T> {
    let start = usize::try_from(request.offset()).unwrap_or(usize::MAX);
    if start >= items.len() {
        return Vec::new();
    }
    let end = start.saturating_add(request.limit() as usize).min(items.len());
    items[start..end].to_vec()
}
