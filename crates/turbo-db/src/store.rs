//! The document store contract consumed by the catalog layer.

use async_trait::async_trait;

use crate::aggregate::Aggregation;
use crate::query::{FindOptions, Predicate, Update};
use crate::types::Document;
use crate::DbError;

/// A document store with find/count/aggregate-style operations.
///
/// Implementations own their indexes; callers only ask whether a weighted
/// text index exists so they can choose between `Predicate::TextSearch` and an
/// explicit OR of field matches.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch matching documents in the requested order and window.
    async fn find(
        &self,
        collection: &str,
        predicate: &Predicate,
        options: &FindOptions,
    ) -> Result<Vec<Document>, DbError>;

    /// Count matching documents.
    async fn count(&self, collection: &str, predicate: &Predicate) -> Result<u64, DbError>;

    /// Run a single-pass aggregation over matching documents.
    async fn aggregate(
        &self,
        collection: &str,
        predicate: &Predicate,
        aggregation: &Aggregation,
    ) -> Result<Vec<Document>, DbError>;

    /// Apply an update to every matching document, returning how many changed.
    async fn update_many(
        &self,
        collection: &str,
        predicate: &Predicate,
        update: &Update,
    ) -> Result<u64, DbError>;

    /// Insert one document.
    async fn insert_one(&self, collection: &str, document: Document) -> Result<(), DbError>;

    /// Whether the collection has a maintained weighted text index.
    fn has_text_index(&self, collection: &str) -> bool;
}
