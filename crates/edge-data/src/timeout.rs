//! Timeout configuration for store calls.

use std::collections::HashMap;
use std::time::Duration;

use crate::dependency::DependencyTag;

/// Per-dependency timeouts. Tags without an override use their default.
#[derive(Debug, Clone, Default)]
pub struct TimeoutConfig {
    overrides: HashMap<DependencyTag, Duration>,
}

impl TimeoutConfig {
    /// Create a configuration using every tag's default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the timeout for one tag.
    pub fn with_timeout(mut self, tag: DependencyTag, timeout: Duration) -> Self {
        self.overrides.insert(tag, timeout);
        self
    }

    /// Apply the same timeout to every tag (useful in tests).
    pub fn uniform(timeout: Duration) -> Self {
        [
            DependencyTag::Search,
            DependencyTag::Facets,
            DependencyTag::Suggestions,
            DependencyTag::Categories,
            DependencyTag::Trending,
            DependencyTag::Analytics,
        ]
        .into_iter()
        .fold(Self::new(), |config, tag| config.with_timeout(tag, timeout))
    }

    /// Resolve the timeout for a tag.
    pub fn for_tag(&self, tag: DependencyTag) -> Duration {
        self.overrides
            .get(&tag)
            .copied()
            .unwrap_or_else(|| tag.default_timeout())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_and_default() {
        let config = TimeoutConfig::new().with_timeout(DependencyTag::Search, Duration::from_millis(50));
        assert_eq!(config.for_tag(DependencyTag::Search), Duration::from_millis(50));
        assert_eq!(
            config.for_tag(DependencyTag::Facets),
            DependencyTag::Facets.default_timeout()
        );
    }

    #[test]
    fn test_uniform() {
        let config = TimeoutConfig::uniform(Duration::from_millis(10));
        assert_eq!(config.for_tag(DependencyTag::Analytics), Duration::from_millis(10));
        assert_eq!(
            config.for_tag(DependencyTag::Custom("x")),
            DependencyTag::Custom("x").default_timeout()
        );
    }
}
