//! Database error types.

use thiserror::Error;

/// Errors that can occur when using the document store.
#[derive(Error, Debug)]
pub enum DbError {
    /// The store could not be reached or refused the operation.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Failed to execute a query.
    #[error("Query execution failed: {0}")]
    QueryError(String),

    /// A text search was issued against a collection without a text index.
    #[error("No text index on collection: {0}")]
    NoTextIndex(String),

    /// Failed to deserialize a document.
    #[error("Deserialization error: {0}")]
    DeserializeError(String),

    /// Type conversion error.
    #[error("Type conversion error: {0}")]
    TypeError(String),
}

impl From<serde_json::Error> for DbError {
    fn from(e: serde_json::Error) -> Self {
        DbError::DeserializeError(e.to_string())
    }
}
