//! Search results and pagination.

use serde::{Deserialize, Serialize};

use crate::catalog::Product;
use crate::search::facets::FacetResult;
use crate::search::filter::FilterSpec;

/// Pagination info.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// Current page (1-indexed).
    pub current_page: u64,
    /// Total number of pages. An empty result still has one page.
    pub total_pages: u64,
    /// Total number of matching items.
    pub total_results: u64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
    /// Items per page.
    pub results_per_page: u64,
}

impl Pagination {
    /// Create pagination info.
    pub fn new(page: u64, per_page: u64, total: u64) -> Self {
        let per_page = per_page.max(1);
        let total_pages = if total == 0 {
            1
        } else {
            total.div_ceil(per_page)
        };

        Self {
            current_page: page,
            total_pages,
            total_results: total,
            has_next_page: page < total_pages,
            has_prev_page: page > 1,
            results_per_page: per_page,
        }
    }

    /// Number of items skipped before the current page.
    pub fn offset(&self) -> u64 {
        page_offset(self.current_page, self.results_per_page)
    }
}

/// Items skipped before a 1-indexed page. Saturates for absurd page numbers.
pub fn page_offset(page: u64, per_page: u64) -> u64 {
    page.saturating_sub(1).saturating_mul(per_page)
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(1, crate::search::filter::DEFAULT_LIMIT, 0)
    }
}

/// A product on a results page, joined with its category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProductHit {
    #[serde(flatten)]
    pub product: Product,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_image: Option<String>,
}

/// Payload of a search response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchData {
    pub products: Vec<ProductHit>,
    pub pagination: Pagination,
    pub filters: FacetResult,
    pub search_query: String,
    pub applied_filters: FilterSpec,
}

impl SearchData {
    /// Check if the page is empty.
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Number of items on this page.
    pub fn len(&self) -> usize {
        self.products.len()
    }
}
