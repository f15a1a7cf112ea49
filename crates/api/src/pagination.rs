//! Page slicing for list and search results

use serde::Serialize;

/// First page number
pub const DEFAULT_PAGE: usize = 1;

/// One page of results plus totals
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResult<T> {
    pub page: usize,
    pub limit: usize,
    pub total_items: usize,
    pub total_pages: usize,
    pub results: Vec<T>,
}

/// Slice `items` into 1-based page `page` of size `limit`
///
/// A page past the end yields empty `results` with the totals intact.
/// `page` and `limit` below 1 are treated as 1.
pub fn paginate<T>(items: Vec<T>, page: usize, limit: usize) -> PaginatedResult<T> {
    let page = page.max(1);
    let limit = limit.max(1);
    let total_items = items.len();
    let total_pages = total_items.div_ceil(limit);
    let start = (page - 1).saturating_mul(limit);

    let results = items.into_iter().skip(start).take(limit).collect();

    PaginatedResult {
        page,
        limit,
        total_items,
        total_pages,
        results,
    }
}
