//! Search module.
//!
//! Filter normalization, predicate building, page execution, facets,
//! suggestions, trending listings, and analytics recording.

mod analytics;
mod engine;
mod executor;
mod facets;
mod filter;
mod predicate;
mod response;
mod results;
mod sort;
mod suggest;
mod trending;

pub use analytics::{
    viewed_products, AnalyticsRecorder, AnalyticsSink, MemoryAnalyticsSink, SearchEvent,
    StoreAnalyticsSink,
};
pub use engine::{SearchEngine, SearchOutcome, SuggestionData, MAX_TRENDING};
pub use executor::{ExecutedSearch, SearchExecutor};
pub use facets::{facet_aggregation, FacetAggregator, FacetResult, PriceRange, SENTINEL_MAX_PRICE};
pub use filter::{parse_limit, CategoryRef, FilterSpec, QueryParams, SortKey, DEFAULT_LIMIT, MAX_LIMIT};
pub use predicate::{
    active_products, filter_predicate, product_text_index, text_predicate, BuiltPredicate,
    PredicateBuilder, FALLBACK_TEXT_FIELDS, TEXT_INDEX_WEIGHTS,
};
pub use response::ApiResponse;
pub use results::{page_offset, Pagination, ProductHit, SearchData};
pub use sort::resolve_sort;
pub use suggest::{
    merge as merge_suggestions, score_product, SuggestionDetail, SuggestionItem, SuggestionRanker,
    SuggestionType,
};
pub use trending::{
    featured_order, popular_order, rank_categories, TrendingCategory, TrendingResolver,
};
