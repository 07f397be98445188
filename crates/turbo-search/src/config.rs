//! Search engine configuration.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use edge_data::{DependencyTag, TimeoutConfig};
use serde::{Deserialize, Serialize};

/// Search engine configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Query execution.
    #[serde(default)]
    pub search: SearchSection,

    /// Autocomplete suggestions.
    #[serde(default)]
    pub suggestions: SuggestionConfig,

    /// Trending, popular, and featured lists.
    #[serde(default)]
    pub trending: TrendingConfig,

    /// Query analytics.
    #[serde(default)]
    pub analytics: AnalyticsConfig,

    /// Per-dependency timeout overrides.
    #[serde(default)]
    pub timeouts: TimeoutSection,
}

impl SearchConfig {
    /// Load config from a file. `.json` files are parsed as JSON, anything else as TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display()))
        } else {
            Self::from_toml(&content)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display()))
        }
    }

    /// Parse a TOML document.
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Timeouts for the store client, defaults plus overrides.
    pub fn timeout_config(&self) -> TimeoutConfig {
        let t = &self.timeouts;
        [
            (DependencyTag::Search, t.search_ms),
            (DependencyTag::Facets, t.facets_ms),
            (DependencyTag::Suggestions, t.suggestions_ms),
            (DependencyTag::Categories, t.categories_ms),
            (DependencyTag::Trending, t.trending_ms),
            (DependencyTag::Analytics, t.analytics_ms),
        ]
        .into_iter()
        .fold(TimeoutConfig::new(), |config, (tag, ms)| match ms {
            Some(ms) => config.with_timeout(tag, Duration::from_millis(ms)),
            None => config,
        })
    }
}

/// Query execution settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchSection {
    /// Delegate free-text scoring to the store's text index when it has one.
    #[serde(default = "default_true")]
    pub use_text_index: bool,
}

impl Default for SearchSection {
    fn default() -> Self {
        Self {
            use_text_index: true,
        }
    }
}

/// Autocomplete settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionConfig {
    #[serde(default = "default_suggestion_limit")]
    pub default_limit: usize,
    #[serde(default = "default_max_suggestions")]
    pub max_limit: usize,
    /// Shortest trimmed query, in characters, that produces suggestions.
    #[serde(default = "default_min_query_len")]
    pub min_query_len: usize,
    #[serde(default = "default_product_limit")]
    pub product_limit: usize,
    #[serde(default = "default_group_limit")]
    pub brand_limit: usize,
    #[serde(default = "default_group_limit")]
    pub category_limit: usize,
}

fn default_suggestion_limit() -> usize {
    10
}

fn default_max_suggestions() -> usize {
    50
}

fn default_min_query_len() -> usize {
    2
}

fn default_product_limit() -> usize {
    5
}

fn default_group_limit() -> usize {
    3
}

impl Default for SuggestionConfig {
    fn default() -> Self {
        Self {
            default_limit: default_suggestion_limit(),
            max_limit: default_max_suggestions(),
            min_query_len: default_min_query_len(),
            product_limit: default_product_limit(),
            brand_limit: default_group_limit(),
            category_limit: default_group_limit(),
        }
    }
}

/// Trending and popularity list sizes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendingConfig {
    #[serde(default = "default_category_limit")]
    pub category_limit: usize,
    #[serde(default = "default_product_list_limit")]
    pub popular_limit: usize,
    #[serde(default = "default_product_list_limit")]
    pub featured_limit: usize,
}

fn default_category_limit() -> usize {
    6
}

fn default_product_list_limit() -> usize {
    10
}

impl Default for TrendingConfig {
    fn default() -> Self {
        Self {
            category_limit: default_category_limit(),
            popular_limit: default_product_list_limit(),
            featured_limit: default_product_list_limit(),
        }
    }
}

/// Analytics settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Timeout overrides in milliseconds. Unset tags keep their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeoutSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facets_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestions_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trending_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analytics_ms: Option<u64>,
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_gives_defaults() {
        let config = SearchConfig::from_toml("").unwrap();
        assert_eq!(config, SearchConfig::default());
        assert!(config.search.use_text_index);
        assert_eq!(config.suggestions.default_limit, 10);
        assert_eq!(config.suggestions.min_query_len, 2);
        assert_eq!(config.trending.category_limit, 6);
        assert!(config.analytics.enabled);
    }

    #[test]
    fn test_partial_sections() {
        let config = SearchConfig::from_toml(
            r#"
            [search]
            use_text_index = false

            [suggestions]
            product_limit = 8

            [timeouts]
            facets_ms = 250
            "#,
        )
        .unwrap();
        assert!(!config.search.use_text_index);
        assert_eq!(config.suggestions.product_limit, 8);
        assert_eq!(config.suggestions.brand_limit, 3);

        let timeouts = config.timeout_config();
        assert_eq!(timeouts.for_tag(DependencyTag::Facets), Duration::from_millis(250));
        assert_eq!(
            timeouts.for_tag(DependencyTag::Search),
            DependencyTag::Search.default_timeout()
        );
    }

    #[test]
    fn test_load_json_by_extension() {
        let path = std::env::temp_dir().join(format!("turbo-search-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"analytics": {"enabled": false}}"#).unwrap();
        let config = SearchConfig::load(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert!(!config.analytics.enabled);
    }

    #[test]
    fn test_load_missing_file_has_context() {
        let err = SearchConfig::load("/nonexistent/search.toml").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
