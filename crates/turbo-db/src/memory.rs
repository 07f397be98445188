//! In-memory document store.
//!
//! Evaluates predicates, orderings, and aggregations the same way a hosted
//! document store would, with optional weighted text indexes. Latency and
//! failures can be injected so callers can exercise their timeout and
//! degradation paths.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering as AtomicOrdering};
use std::sync::{Mutex, RwLock};
use std::time::Duration;

use async_trait::async_trait;

use crate::aggregate::Aggregation;
use crate::query::{Direction, FindOptions, Predicate, SortField, SortSpec, Update};
use crate::store::DocumentStore;
use crate::types::{compare_values, field_values, sort_order, values_equal, Document, Value};
use crate::DbError;

/// Store operations, used to target injected failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    Find,
    Count,
    Aggregate,
    Update,
    Insert,
}

/// A weighted text index over several fields.
///
/// A document scores the weight of every field that contains a query term
/// (case-insensitive token match), once per matching term.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextIndex {
    weights: Vec<(String, u32)>,
}

impl TextIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index a field with a weight.
    pub fn with_field(mut self, field: impl Into<String>, weight: u32) -> Self {
        self.weights.push((field.into(), weight));
        self
    }

    pub fn fields(&self) -> &[(String, u32)] {
        &self.weights
    }

    /// Score a document against a query.
    pub fn score(&self, document: &Document, query: &str) -> u32 {
        let terms = tokenize(query);
        if terms.is_empty() {
            return 0;
        }

        self.weights
            .iter()
            .map(|(field, weight)| {
                let tokens: BTreeSet<String> = field_values(document, field)
                    .into_iter()
                    .filter_map(|v| v.as_str())
                    .flat_map(tokenize)
                    .collect();
                let hits = terms.iter().filter(|t| tokens.contains(*t)).count() as u32;
                hits * weight
            })
            .sum()
    }
}

/// Distinct lowercase terms of a text.
fn tokenize(text: &str) -> BTreeSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

/// In-memory implementation of [`DocumentStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<Document>>>,
    text_indexes: HashMap<String, TextIndex>,
    latency_ms: AtomicU64,
    unavailable: AtomicBool,
    failing: Mutex<HashSet<StoreOp>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a weighted text index to a collection.
    pub fn with_text_index(mut self, collection: impl Into<String>, index: TextIndex) -> Self {
        self.text_indexes.insert(collection.into(), index);
        self
    }

    /// Seed documents without going through the async API.
    pub fn insert_many(
        &self,
        collection: &str,
        documents: impl IntoIterator<Item = Document>,
    ) -> Result<(), DbError> {
        let mut collections = self.write()?;
        collections
            .entry(collection.to_string())
            .or_default()
            .extend(documents);
        Ok(())
    }

    /// Snapshot a collection.
    pub fn documents(&self, collection: &str) -> Result<Vec<Document>, DbError> {
        Ok(self.read()?.get(collection).cloned().unwrap_or_default())
    }

    /// Delay every subsequent operation.
    pub fn set_latency(&self, latency: Duration) {
        self.latency_ms
            .store(latency.as_millis() as u64, AtomicOrdering::SeqCst);
    }

    /// Toggle whole-store availability.
    pub fn set_available(&self, available: bool) {
        self.unavailable.store(!available, AtomicOrdering::SeqCst);
    }

    /// Make one kind of operation fail until cleared.
    pub fn fail_operation(&self, op: StoreOp) {
        if let Ok(mut failing) = self.failing.lock() {
            failing.insert(op);
        }
    }

    /// Clear all injected operation failures.
    pub fn clear_failures(&self) {
        if let Ok(mut failing) = self.failing.lock() {
            failing.clear();
        }
    }

    async fn gate(&self, op: StoreOp) -> Result<(), DbError> {
        let latency = self.latency_ms.load(AtomicOrdering::SeqCst);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }
        if self.unavailable.load(AtomicOrdering::SeqCst) {
            return Err(DbError::Unavailable("store is offline".to_string()));
        }
        let failing = self
            .failing
            .lock()
            .map(|f| f.contains(&op))
            .unwrap_or(false);
        if failing {
            return Err(DbError::QueryError(format!("{:?} rejected", op)));
        }
        Ok(())
    }

    fn read(
        &self,
    ) -> Result<std::sync::RwLockReadGuard<'_, HashMap<String, Vec<Document>>>, DbError> {
        self.collections
            .read()
            .map_err(|_| DbError::Unavailable("collection lock poisoned".to_string()))
    }

    fn write(
        &self,
    ) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<String, Vec<Document>>>, DbError> {
        self.collections
            .write()
            .map_err(|_| DbError::Unavailable("collection lock poisoned".to_string()))
    }

    fn text_index_for(
        &self,
        collection: &str,
        predicate: &Predicate,
    ) -> Result<Option<&TextIndex>, DbError> {
        match predicate.text_query() {
            None => Ok(self.text_indexes.get(collection)),
            Some(_) => self
                .text_indexes
                .get(collection)
                .map(Some)
                .ok_or_else(|| DbError::NoTextIndex(collection.to_string())),
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find(
        &self,
        collection: &str,
        predicate: &Predicate,
        options: &FindOptions,
    ) -> Result<Vec<Document>, DbError> {
        self.gate(StoreOp::Find).await?;
        let index = self.text_index_for(collection, predicate)?;
        let collections = self.read()?;
        let Some(documents) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        let query = predicate.text_query();
        let mut scored: Vec<(u32, &Document)> = documents
            .iter()
            .filter(|d| evaluate(predicate, d, index))
            .map(|d| {
                let score = match (query, index) {
                    (Some(q), Some(i)) => i.score(d, q),
                    _ => 0,
                };
                (score, d)
            })
            .collect();

        scored.sort_by(|a, b| compare_rows(&options.sort, a, b));

        let limit = options.limit.map(|l| l as usize).unwrap_or(usize::MAX);
        Ok(scored
            .into_iter()
            .skip(usize::try_from(options.skip).unwrap_or(usize::MAX))
            .take(limit)
            .map(|(_, d)| d.clone())
            .collect())
    }

    async fn count(&self, collection: &str, predicate: &Predicate) -> Result<u64, DbError> {
        self.gate(StoreOp::Count).await?;
        let index = self.text_index_for(collection, predicate)?;
        let collections = self.read()?;
        Ok(collections
            .get(collection)
            .map(|docs| docs.iter().filter(|d| evaluate(predicate, d, index)).count() as u64)
            .unwrap_or(0))
    }

    async fn aggregate(
        &self,
        collection: &str,
        predicate: &Predicate,
        aggregation: &Aggregation,
    ) -> Result<Vec<Document>, DbError> {
        self.gate(StoreOp::Aggregate).await?;
        let index = self.text_index_for(collection, predicate)?;
        let collections = self.read()?;
        let Some(documents) = collections.get(collection) else {
            return Ok(Vec::new());
        };
        Ok(aggregation.evaluate(documents.iter().filter(|d| evaluate(predicate, d, index))))
    }

    async fn update_many(
        &self,
        collection: &str,
        predicate: &Predicate,
        update: &Update,
    ) -> Result<u64, DbError> {
        self.gate(StoreOp::Update).await?;
        let index = self.text_index_for(collection, predicate)?.cloned();
        let mut collections = self.write()?;
        let Some(documents) = collections.get_mut(collection) else {
            return Ok(0);
        };

        let mut changed = 0;
        for document in documents.iter_mut() {
            if !evaluate(predicate, document, index.as_ref()) {
                continue;
            }
            apply_update(document, update)?;
            changed += 1;
        }
        Ok(changed)
    }

    async fn insert_one(&self, collection: &str, document: Document) -> Result<(), DbError> {
        self.gate(StoreOp::Insert).await?;
        self.write()?
            .entry(collection.to_string())
            .or_default()
            .push(document);
        Ok(())
    }

    fn has_text_index(&self, collection: &str) -> bool {
        self.text_indexes.contains_key(collection)
    }
}

fn evaluate(predicate: &Predicate, document: &Document, index: Option<&TextIndex>) -> bool {
    match predicate {
        Predicate::All => true,
        Predicate::Eq { field, value } => {
            if value.is_null() {
                return field_values(document, field).is_empty();
            }
            field_values(document, field)
                .iter()
                .any(|v| values_equal(v, value))
        }
        Predicate::Compare { field, op, value } => field_values(document, field)
            .iter()
            .any(|v| compare_values(v, value).is_some_and(|o| op.accepts(o))),
        Predicate::In { field, values } => field_values(document, field)
            .iter()
            .any(|v| values.iter().any(|x| values_equal(v, x))),
        Predicate::Matches {
            field,
            pattern,
            mode,
        } => field_values(document, field)
            .iter()
            .filter_map(|v| v.as_str())
            .any(|s| mode.matches(s, pattern)),
        Predicate::TextSearch(query) => index.is_some_and(|i| i.score(document, query) > 0),
        Predicate::And(predicates) => predicates.iter().all(|p| evaluate(p, document, index)),
        Predicate::Or(predicates) => predicates.iter().any(|p| evaluate(p, document, index)),
    }
}

fn compare_rows(
    sort: &SortSpec,
    a: &(u32, &Document),
    b: &(u32, &Document),
) -> std::cmp::Ordering {
    for key in sort.keys() {
        let ordering = match &key.field {
            SortField::TextScore => a.0.cmp(&b.0),
            SortField::Field(field) => sort_order(a.1.get(field), b.1.get(field)),
        };
        let ordering = match key.direction {
            Direction::Asc => ordering,
            Direction::Desc => ordering.reverse(),
        };
        if ordering.is_ne() {
            return ordering;
        }
    }
    std::cmp::Ordering::Equal
}

fn apply_update(document: &mut Document, update: &Update) -> Result<(), DbError> {
    match update {
        Update::Increment { field, by } => {
            let next = match document.get(field) {
                None | Some(Value::Null) => Value::from(*by),
                Some(Value::Number(n)) => match n.as_i64() {
                    Some(i) => Value::from(i + by),
                    None => Value::from(n.as_f64().unwrap_or(0.0) + *by as f64),
                },
                Some(other) => {
                    return Err(DbError::TypeError(format!(
                        "cannot increment non-numeric field {}: {}",
                        field, other
                    )))
                }
            };
            document.insert(field.clone(), next);
        }
    }
    Ok(())
}
