//! The search engine: one entry point per storefront read.

use std::sync::Arc;
use std::time::Instant;

use edge_data::{FetchError, StoreClient};
use edge_observability::{RequestId, StructuredLogger};
use serde::Serialize;
use tokio::task::JoinHandle;
use turbo_db::DocumentStore;

use crate::catalog::Product;
use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::ids::UserId;
use crate::search::analytics::{AnalyticsRecorder, AnalyticsSink, StoreAnalyticsSink};
use crate::search::executor::SearchExecutor;
use crate::search::facets::{FacetAggregator, FacetResult};
use crate::search::filter::{parse_limit, FilterSpec, QueryParams, MAX_LIMIT};
use crate::search::predicate::{active_products, PredicateBuilder};
use crate::search::response::ApiResponse;
use crate::search::results::SearchData;
use crate::search::sort::resolve_sort;
use crate::search::suggest::{SuggestionItem, SuggestionRanker};
use crate::search::trending::{TrendingCategory, TrendingResolver};

/// Upper bound on the trending categories listing.
pub const MAX_TRENDING: usize = 50;

/// A finished search plus the analytics task it started, if any.
#[derive(Debug)]
pub struct SearchOutcome {
    pub data: SearchData,
    /// Dropping the handle does not cancel the task.
    pub analytics: Option<JoinHandle<()>>,
}

/// Payload of a suggestions response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuggestionData {
    pub suggestions: Vec<SuggestionItem>,
    pub query: String,
    pub trending: Vec<TrendingCategory>,
}

/// Serves search, suggestion, filter-option, and listing reads.
///
/// Holds no per-request state; every call builds its own logger and
/// predicate, so one engine can be shared across concurrent requests.
#[derive(Clone)]
pub struct SearchEngine {
    client: StoreClient,
    config: SearchConfig,
    analytics: AnalyticsRecorder,
}

impl SearchEngine {
    /// Create an engine over a store. Analytics go to the store's analytics collection.
    pub fn new(store: Arc<dyn DocumentStore>, config: SearchConfig) -> Self {
        let client = StoreClient::new(store).with_timeouts(config.timeout_config());
        let sink = Arc::new(StoreAnalyticsSink::new(client.clone()));
        let analytics =
            AnalyticsRecorder::new(sink, client.clone()).with_enabled(config.analytics.enabled);
        Self {
            client,
            config,
            analytics,
        }
    }

    /// Send analytics events somewhere else.
    pub fn with_analytics_sink(mut self, sink: Arc<dyn AnalyticsSink>) -> Self {
        self.analytics = self.analytics.with_sink(sink);
        self
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn client(&self) -> &StoreClient {
        &self.client
    }

    /// Run a filtered, paginated search with facets.
    ///
    /// Store failures on the page or count surface as
    /// [`SearchError::Unavailable`]. Facet failures degrade to the sentinel.
    pub async fn search(
        &self,
        params: &QueryParams,
        user_id: Option<UserId>,
    ) -> Result<SearchOutcome, SearchError> {
        let logger = request_logger("search");
        let started = Instant::now();
        let spec = FilterSpec::from_params(params);
        logger
            .debug_builder("filters normalized")
            .field("sort", spec.sort.as_str())
            .field_i64("page", spec.page as i64)
            .field_i64("limit", spec.limit as i64)
            .field_bool("has_query", spec.has_query())
            .emit();

        let built = PredicateBuilder::new(&self.client)
            .with_text_index(self.config.search.use_text_index)
            .build(&spec)
            .await
            .map_err(|e| surface(&logger, e))?;
        let sort = resolve_sort(spec.sort, spec.has_query(), built.text_scored);
        logger
            .debug_builder("predicate built")
            .field_bool("text_scored", built.text_scored)
            .field_bool("category_resolved", built.category.is_some())
            .emit();

        let executor = SearchExecutor::new(&self.client);
        let aggregator = FacetAggregator::new(&self.client);
        let (executed, facets) = futures::join!(
            executor.execute(&built.predicate, &sort, spec.page, spec.limit),
            aggregator.compute(&built.predicate)
        );
        let executed = executed.map_err(|e| surface(&logger, e))?;
        let filters = facets.unwrap_or_else(|e| {
            logger
                .warn_builder("facets degraded to sentinel")
                .field("error", e.to_string())
                .emit();
            FacetResult::sentinel()
        });

        let total = executed.pagination.total_results;
        let data = SearchData {
            search_query: spec.query().unwrap_or_default().to_string(),
            products: executed.hits,
            pagination: executed.pagination,
            filters,
            applied_filters: spec,
        };

        let analytics = data
            .applied_filters
            .query()
            .and_then(|q| self.analytics.record(q, total, user_id, &logger));

        logger
            .info_builder("search completed")
            .field_i64("total", total as i64)
            .field_i64("returned", data.len() as i64)
            .duration_ms("duration_ms", started.elapsed())
            .emit();

        Ok(SearchOutcome { data, analytics })
    }

    /// [`search`](Self::search) wrapped in a response envelope.
    pub async fn search_response(
        &self,
        params: &QueryParams,
        user_id: Option<UserId>,
    ) -> ApiResponse<SearchData> {
        ApiResponse::from_result(self.search(params, user_id).await.map(|o| o.data))
    }

    /// Autocomplete suggestions plus trending categories.
    ///
    /// Never fails: store errors degrade to empty lists.
    pub async fn suggestions(&self, params: &QueryParams) -> SuggestionData {
        let logger = request_logger("suggestions");
        let config = &self.config.suggestions;
        let query = params
            .get("q")
            .map(|q| q.trim().to_string())
            .unwrap_or_default();
        let limit = parse_limit(params, config.default_limit, config.max_limit);

        let ranker = SuggestionRanker::new(&self.client, config);
        let resolver = TrendingResolver::new(&self.client);
        let (suggestions, trending) = futures::join!(
            ranker.suggest(&query, limit),
            resolver.trending_categories(self.config.trending.category_limit)
        );

        let suggestions = suggestions.unwrap_or_else(|e| {
            logger
                .warn_builder("suggestions degraded to empty")
                .field("error", e.to_string())
                .emit();
            Vec::new()
        });
        let trending = trending.unwrap_or_else(|e| {
            logger
                .warn_builder("trending fallback unavailable")
                .field("error", e.to_string())
                .emit();
            Vec::new()
        });

        logger
            .info_builder("suggestions served")
            .field_i64("count", suggestions.len() as i64)
            .emit();

        SuggestionData {
            suggestions,
            query,
            trending,
        }
    }

    /// Facets over the whole active catalog.
    pub async fn filter_options(&self) -> Result<FacetResult, SearchError> {
        let logger = request_logger("filter-options");
        FacetAggregator::new(&self.client)
            .compute(&active_products())
            .await
            .map_err(|e| surface(&logger, e))
    }

    /// Trending categories. `limit` defaults to the configured size, at most 50.
    pub async fn trending_categories(
        &self,
        params: &QueryParams,
    ) -> Result<Vec<TrendingCategory>, SearchError> {
        let logger = request_logger("trending");
        let limit = parse_limit(params, self.config.trending.category_limit, MAX_TRENDING);
        TrendingResolver::new(&self.client)
            .trending_categories(limit)
            .await
            .map_err(|e| surface(&logger, e))
    }

    /// Popular products. `limit` defaults to the configured size, at most 100.
    pub async fn popular_products(&self, params: &QueryParams) -> Result<Vec<Product>, SearchError> {
        let logger = request_logger("popular");
        let limit = parse_limit(params, self.config.trending.popular_limit, MAX_LIMIT as usize);
        TrendingResolver::new(&self.client)
            .popular_products(limit)
            .await
            .map_err(|e| surface(&logger, e))
    }

    /// Featured products. `limit` defaults to the configured size, at most 100.
    pub async fn featured_products(&self, params: &QueryParams) -> Result<Vec<Product>, SearchError> {
        let logger = request_logger("featured");
        let limit = parse_limit(params, self.config.trending.featured_limit, MAX_LIMIT as usize);
        TrendingResolver::new(&self.client)
            .featured_products(limit)
            .await
            .map_err(|e| surface(&logger, e))
    }

    /// [`suggestions`](Self::suggestions) in a response envelope. Always succeeds.
    pub async fn suggestions_response(&self, params: &QueryParams) -> ApiResponse<SuggestionData> {
        ApiResponse::ok(self.suggestions(params).await)
    }

    pub async fn filter_options_response(&self) -> ApiResponse<FacetResult> {
        ApiResponse::from_result(self.filter_options().await)
    }

    pub async fn trending_categories_response(
        &self,
        params: &QueryParams,
    ) -> ApiResponse<Vec<TrendingCategory>> {
        ApiResponse::from_result(self.trending_categories(params).await)
    }

    pub async fn popular_products_response(&self, params: &QueryParams) -> ApiResponse<Vec<Product>> {
        ApiResponse::from_result(self.popular_products(params).await)
    }

    pub async fn featured_products_response(&self, params: &QueryParams) -> ApiResponse<Vec<Product>> {
        ApiResponse::from_result(self.featured_products(params).await)
    }
}

fn request_logger(route: &str) -> StructuredLogger {
    StructuredLogger::new(RequestId::generate()).with_route(route)
}

/// Log a store failure with its detail and turn it into the generic error.
fn surface(logger: &StructuredLogger, error: FetchError) -> SearchError {
    let timed_out = error.is_timeout();
    let dependency = error.tag().to_string();
    let error = SearchError::from(error);
    logger
        .error_builder("request failed")
        .field("dependency", dependency)
        .field_bool("timeout", timed_out)
        .field("detail", error.detail())
        .emit();
    error
}
