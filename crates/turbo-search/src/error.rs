//! Search error types.

use edge_data::FetchError;
use thiserror::Error;

/// Generic text shown to end users when a search cannot be served.
pub const SEARCH_FAILED: &str = "Search failed";

/// Errors that can occur while serving storefront reads.
#[derive(Error, Debug)]
pub enum SearchError {
    /// The store was unavailable or timed out. The detail is for logs only.
    #[error("Search failed")]
    Unavailable { detail: String },

    /// A document could not be converted.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// An analytics sink rejected an event.
    #[error("Analytics error: {0}")]
    Analytics(String),
}

impl SearchError {
    /// Create an unavailable error carrying a diagnostic detail.
    pub fn unavailable(detail: impl Into<String>) -> Self {
        SearchError::Unavailable {
            detail: detail.into(),
        }
    }

    /// Diagnostic detail for logs. Never shown to end users.
    pub fn detail(&self) -> String {
        match self {
            SearchError::Unavailable { detail } => detail.clone(),
            other => other.to_string(),
        }
    }

    /// Message safe to put in a response envelope.
    pub fn user_message(&self) -> &'static str {
        SEARCH_FAILED
    }
}

impl From<FetchError> for SearchError {
    fn from(e: FetchError) -> Self {
        SearchError::unavailable(e.to_string())
    }
}

impl From<turbo_db::DbError> for SearchError {
    fn from(e: turbo_db::DbError) -> Self {
        SearchError::Serialization(e.to_string())
    }
}

impl From<serde_json::Error> for SearchError {
    fn from(e: serde_json::Error) -> Self {
        SearchError::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edge_data::DependencyTag;
    use std::time::Duration;

    #[test]
    fn test_unavailable_hides_detail() {
        let err = SearchError::from(FetchError::Timeout {
            tag: DependencyTag::Search,
            operation: "count",
            after: Duration::from_millis(5),
        });
        assert_eq!(err.to_string(), "Search failed");
        assert!(err.detail().contains("timed out"));
        assert_eq!(err.user_message(), SEARCH_FAILED);
    }

    #[test]
    fn test_analytics_message() {
        let err = SearchError::Analytics("sink closed".into());
        assert_eq!(err.detail(), "Analytics error: sink closed");
    }
}
