//! Fire-and-forget search analytics.
//!
//! Recording happens on a detached task after the response is built. Sink
//! and counter failures are logged and otherwise ignored.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use edge_data::{DependencyTag, StoreClient};
use edge_observability::StructuredLogger;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use turbo_db::{to_document, Predicate, Update};

use crate::catalog::{product_fields as f, PRODUCTS, SEARCH_ANALYTICS};
use crate::error::SearchError;
use crate::ids::UserId;
use crate::search::predicate::active_products;

/// One recorded search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchEvent {
    pub query: String,
    pub result_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    pub timestamp: DateTime<Utc>,
}

impl SearchEvent {
    pub fn new(query: impl Into<String>, result_count: u64) -> Self {
        Self {
            query: query.into(),
            result_count,
            user_id: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_user(mut self, user_id: Option<UserId>) -> Self {
        self.user_id = user_id;
        self
    }
}

/// Destination for search events.
#[async_trait]
pub trait AnalyticsSink: Send + Sync {
    /// Record one event.
    async fn record(&self, event: &SearchEvent) -> Result<(), SearchError>;
}

/// Writes events to the analytics collection of the document store.
pub struct StoreAnalyticsSink {
    client: StoreClient,
}

impl StoreAnalyticsSink {
    pub fn new(client: StoreClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AnalyticsSink for StoreAnalyticsSink {
    async fn record(&self, event: &SearchEvent) -> Result<(), SearchError> {
        let document = to_document(event)?;
        self.client
            .insert_one(DependencyTag::Analytics, SEARCH_ANALYTICS, document)
            .await
            .map_err(|e| SearchError::Analytics(e.to_string()))
    }
}

/// Keeps events in memory. Useful for tests and local runs.
#[derive(Debug, Default)]
pub struct MemoryAnalyticsSink {
    events: Mutex<Vec<SearchEvent>>,
    failing: AtomicBool,
}

impl MemoryAnalyticsSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `record` fail.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Snapshot of recorded events.
    pub fn events(&self) -> Vec<SearchEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl AnalyticsSink for MemoryAnalyticsSink {
    async fn record(&self, event: &SearchEvent) -> Result<(), SearchError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(SearchError::Analytics("sink rejected event".to_string()));
        }
        self.events
            .lock()
            .map_err(|_| SearchError::Analytics("sink lock poisoned".to_string()))?
            .push(event.clone());
        Ok(())
    }
}

/// Records qualifying searches on a background task.
#[derive(Clone)]
pub struct AnalyticsRecorder {
    sink: Arc<dyn AnalyticsSink>,
    client: StoreClient,
    enabled: bool,
}

impl AnalyticsRecorder {
    pub fn new(sink: Arc<dyn AnalyticsSink>, client: StoreClient) -> Self {
        Self {
            sink,
            client,
            enabled: true,
        }
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Replace the sink.
    pub fn with_sink(mut self, sink: Arc<dyn AnalyticsSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Only non-empty free-text searches are recorded.
    pub fn should_record(&self, query: &str) -> bool {
        self.enabled && !query.trim().is_empty()
    }

    /// Spawn recording for a finished search.
    ///
    /// Returns the task handle so callers may await it; dropping it leaves
    /// the task running. Returns `None` when nothing qualifies or there is no
    /// runtime to spawn on.
    pub fn record(
        &self,
        query: &str,
        result_count: u64,
        user_id: Option<UserId>,
        logger: &StructuredLogger,
    ) -> Option<JoinHandle<()>> {
        if !self.should_record(query) {
            return None;
        }

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                logger.warn("analytics skipped: no async runtime");
                return None;
            }
        };

        let event = SearchEvent::new(query.trim(), result_count).with_user(user_id);
        let sink = Arc::clone(&self.sink);
        let client = self.client.clone();
        let logger = logger.clone();

        Some(runtime.spawn(async move {
            if let Err(e) = sink.record(&event).await {
                logger
                    .warn_builder("analytics event dropped")
                    .field("error", e.to_string())
                    .emit();
            }

            match client
                .update_many(
                    DependencyTag::Analytics,
                    PRODUCTS,
                    &viewed_products(&event.query),
                    &Update::increment(f::VIEW_COUNT, 1),
                )
                .await
            {
                Ok(updated) => logger
                    .debug_builder("view counters bumped")
                    .field_i64("updated", updated as i64)
                    .emit(),
                Err(e) => logger
                    .warn_builder("view counter update failed")
                    .field("error", e.to_string())
                    .emit(),
            }
        }))
    }
}

/// Active products whose name or brand matched a query.
pub fn viewed_products(query: &str) -> Predicate {
    Predicate::and(vec![
        active_products(),
        Predicate::or(vec![
            Predicate::contains(f::NAME, query),
            Predicate::contains(f::BRAND, query),
        ]),
    ])
}
