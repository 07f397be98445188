//! Document store layer for the TurboCommerce catalog.
//!
//! Provides the store contract the search engine reads through, a small
//! predicate/ordering/aggregation vocabulary, and an in-memory store.
//!
//! # Example
//!
//! ```rust,ignore
//! use turbo_db::prelude::*;
//!
//! let store = MemoryStore::new()
//!     .with_text_index("products", TextIndex::new().with_field("name", 10));
//!
//! let active = Predicate::eq("isActive", true);
//! let cheapest = store
//!     .find("products", &active, &FindOptions::new().sort(SortSpec::asc("price")).limit(5))
//!     .await?;
//! ```

mod error;
mod types;

pub mod aggregate;
pub mod memory;
pub mod query;
pub mod store;

pub use aggregate::{desc_by, Accumulator, Aggregation, GROUP_KEY};
pub use error::DbError;
pub use memory::{MemoryStore, StoreOp, TextIndex};
pub use query::{
    CompareOp, Direction, FindOptions, MatchMode, Predicate, SortField, SortKey, SortSpec, Update,
};
pub use store::DocumentStore;
pub use types::{
    compare_values, deserialize_all, field_values, from_document, sort_order, to_document,
    values_equal, Document, Value,
};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        Accumulator, Aggregation, DbError, Document, DocumentStore, FindOptions, MatchMode,
        MemoryStore, Predicate, SortSpec, TextIndex, Update, Value,
    };
}
