//! Product search, filtering, and facets for TurboCommerce storefronts.
//!
//! This crate serves the catalog read paths of a storefront:
//!
//! - **Search**: filtered, sorted, paginated product listings with facets
//! - **Suggestions**: autocomplete over product names, brands, and categories
//! - **Trending**: trending categories plus popular and featured products
//! - **Analytics**: fire-and-forget recording of free-text searches
//!
//! Everything reads from a [`turbo_db::DocumentStore`] through an
//! [`edge_data::StoreClient`], which bounds every call by a per-dependency timeout.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use turbo_db::MemoryStore;
//! use turbo_search::prelude::*;
//!
//! let store = Arc::new(MemoryStore::new());
//! let engine = SearchEngine::new(store, SearchConfig::default());
//!
//! let params: QueryParams = [("q".to_string(), "shirt".to_string())].into();
//! let outcome = engine.search(&params, None).await?;
//! println!("{} results", outcome.data.pagination.total_results);
//! ```

pub mod config;
pub mod error;
pub mod ids;

pub mod catalog;
pub mod search;

pub use config::SearchConfig;
pub use error::SearchError;
pub use ids::*;
pub use search::{ApiResponse, SearchEngine};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::config::{
        AnalyticsConfig, SearchConfig, SearchSection, SuggestionConfig, TimeoutSection,
        TrendingConfig,
    };
    pub use crate::error::SearchError;
    pub use crate::ids::*;

    // Catalog
    pub use crate::catalog::{Category, Product};

    // Search
    pub use crate::search::{
        AnalyticsSink, ApiResponse, FacetResult, FilterSpec, MemoryAnalyticsSink, Pagination,
        ProductHit, QueryParams, SearchData, SearchEngine, SearchEvent, SearchOutcome, SortKey,
        SuggestionData, SuggestionItem, SuggestionType, TrendingCategory,
    };
}
