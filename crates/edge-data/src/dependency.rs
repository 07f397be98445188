//! Dependency tagging for semantic categorization.

use std::time::Duration;

/// Well-known dependency categories with semantic meaning.
///
/// Each tag carries a default timeout and says whether its failure must be
/// surfaced to the caller or can be degraded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DependencyTag {
    /// Product page fetch and count.
    Search,
    /// Facet aggregation.
    Facets,
    /// Autocomplete candidate queries.
    Suggestions,
    /// Category lookups and joins.
    Categories,
    /// Trending, popular, and featured listings.
    Trending,
    /// Search analytics and view counters.
    Analytics,
    /// Custom dependency with name.
    Custom(&'static str),
}

impl DependencyTag {
    /// Get the default timeout for this dependency type.
    pub fn default_timeout(&self) -> Duration {
        match self {
            Self::Search => Duration::from_millis(2000),
            Self::Facets => Duration::from_millis(1500),
            Self::Suggestions => Duration::from_millis(800),
            Self::Categories => Duration::from_millis(1000),
            Self::Trending => Duration::from_millis(1000),
            Self::Analytics => Duration::from_millis(500),
            Self::Custom(_) => Duration::from_millis(1000),
        }
    }

    /// Get the name of this dependency.
    pub fn name(&self) -> &str {
        match self {
            Self::Search => "search",
            Self::Facets => "facets",
            Self::Suggestions => "suggestions",
            Self::Categories => "categories",
            Self::Trending => "trending",
            Self::Analytics => "analytics",
            Self::Custom(name) => name,
        }
    }
}

impl std::fmt::Display for DependencyTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names() {
        assert_eq!(DependencyTag::Suggestions.to_string(), "suggestions");
        assert_eq!(DependencyTag::Custom("reviews").name(), "reviews");
    }
}
