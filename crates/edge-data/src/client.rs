//! Store client with dependency tagging and bounded timeouts.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use turbo_db::{
    deserialize_all, Aggregation, DbError, Document, DocumentStore, FindOptions, Predicate, Update,
};

use crate::dependency::DependencyTag;
use crate::timeout::TimeoutConfig;

/// Error type for store operations issued through [`StoreClient`].
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("{tag} {operation} timed out after {after:?}")]
    Timeout {
        tag: DependencyTag,
        operation: &'static str,
        after: Duration,
    },

    #[error("{tag} {operation} failed: {source}")]
    Store {
        tag: DependencyTag,
        operation: &'static str,
        #[source]
        source: DbError,
    },
}

impl FetchError {
    /// The dependency the failing call was tagged with.
    pub fn tag(&self) -> DependencyTag {
        match self {
            Self::Timeout { tag, .. } | Self::Store { tag, .. } => *tag,
        }
    }

    /// Whether the call hit its timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Platform-controlled store client.
///
/// Every call is tagged with a dependency and bounded by that dependency's
/// timeout, so a slow store surfaces as an error instead of a hang.
#[derive(Clone)]
pub struct StoreClient {
    store: Arc<dyn DocumentStore>,
    timeouts: TimeoutConfig,
}

impl std::fmt::Debug for StoreClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreClient")
            .field("timeouts", &self.timeouts)
            .finish_non_exhaustive()
    }
}

impl StoreClient {
    /// Create a new store client.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            timeouts: TimeoutConfig::default(),
        }
    }

    /// Set the timeout configuration.
    pub fn with_timeouts(mut self, timeouts: TimeoutConfig) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Find documents and deserialize them.
    pub async fn find<T: DeserializeOwned>(
        &self,
        tag: DependencyTag,
        collection: &str,
        predicate: &Predicate,
        options: &FindOptions,
    ) -> Result<Vec<T>, FetchError> {
        let documents = self.find_documents(tag, collection, predicate, options).await?;
        deserialize_all(documents).map_err(|source| FetchError::Store {
            tag,
            operation: "find",
            source,
        })
    }

    /// Find raw documents.
    pub async fn find_documents(
        &self,
        tag: DependencyTag,
        collection: &str,
        predicate: &Predicate,
        options: &FindOptions,
    ) -> Result<Vec<Document>, FetchError> {
        self.bounded(tag, "find", self.store.find(collection, predicate, options))
            .await
    }

    /// Count matching documents.
    pub async fn count(
        &self,
        tag: DependencyTag,
        collection: &str,
        predicate: &Predicate,
    ) -> Result<u64, FetchError> {
        self.bounded(tag, "count", self.store.count(collection, predicate))
            .await
    }

    /// Run an aggregation.
    pub async fn aggregate(
        &self,
        tag: DependencyTag,
        collection: &str,
        predicate: &Predicate,
        aggregation: &Aggregation,
    ) -> Result<Vec<Document>, FetchError> {
        self.bounded(
            tag,
            "aggregate",
            self.store.aggregate(collection, predicate, aggregation),
        )
        .await
    }

    /// Apply an update to matching documents.
    pub async fn update_many(
        &self,
        tag: DependencyTag,
        collection: &str,
        predicate: &Predicate,
        update: &Update,
    ) -> Result<u64, FetchError> {
        self.bounded(
            tag,
            "update",
            self.store.update_many(collection, predicate, update),
        )
        .await
    }

    /// Insert one document.
    pub async fn insert_one(
        &self,
        tag: DependencyTag,
        collection: &str,
        document: Document,
    ) -> Result<(), FetchError> {
        self.bounded(tag, "insert", self.store.insert_one(collection, document))
            .await
    }

    /// Whether the collection has a weighted text index.
    pub fn has_text_index(&self, collection: &str) -> bool {
        self.store.has_text_index(collection)
    }

    async fn bounded<T>(
        &self,
        tag: DependencyTag,
        operation: &'static str,
        call: impl Future<Output = Result<T, DbError>>,
    ) -> Result<T, FetchError> {
        let after = self.timeouts.for_tag(tag);
        match tokio::time::timeout(after, call).await {
            Ok(result) => result.map_err(|source| FetchError::Store {
                tag,
                operation,
                source,
            }),
            Err(_) => {
                tracing::warn!(dependency = %tag, operation, timeout_ms = after.as_millis() as u64, "store call timed out");
                Err(FetchError::Timeout {
                    tag,
                    operation,
                    after,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;
    use turbo_db::{MemoryStore, StoreOp};

    #[derive(Debug, Deserialize)]
    struct Item {
        name: String,
    }

    fn store() -> Arc<MemoryStore> {
        let store = MemoryStore::new();
        let doc = match json!({"name": "Lamp", "isActive": true}) {
            serde_json::Value::Object(map) => map,
            _ => unreachable!(),
        };
        store.insert_many("products", vec![doc]).unwrap();
        Arc::new(store)
    }

    #[tokio::test]
    async fn test_find_deserializes() {
        let client = StoreClient::new(store());
        let items: Vec<Item> = client
            .find(DependencyTag::Search, "products", &Predicate::All, &FindOptions::new())
            .await
            .unwrap();
        assert_eq!(items[0].name, "Lamp");
    }

    #[tokio::test]
    async fn test_slow_store_times_out() {
        let store = store();
        store.set_latency(Duration::from_millis(200));
        let client = StoreClient::new(store).with_timeouts(
            TimeoutConfig::new().with_timeout(DependencyTag::Search, Duration::from_millis(20)),
        );
        let err = client
            .count(DependencyTag::Search, "products", &Predicate::All)
            .await
            .unwrap_err();
        assert!(err.is_timeout());
        assert_eq!(err.tag(), DependencyTag::Search);
    }

    #[tokio::test]
    async fn test_store_errors_are_tagged() {
        let store = store();
        store.fail_operation(StoreOp::Count);
        let client = StoreClient::new(store);
        let err = client
            .count(DependencyTag::Facets, "products", &Predicate::All)
            .await
            .unwrap_err();
        assert!(!err.is_timeout());
        assert_eq!(err.tag(), DependencyTag::Facets);
        assert!(err.to_string().contains("facets count failed"));
    }
}
