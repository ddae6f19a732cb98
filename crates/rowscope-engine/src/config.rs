//! Console configuration.

use std::time::Duration;

use rowscope_core::{RowCountEstimator, THRESHOLD_COUNT};

/// Configuration for a [`Console`](crate::Console).
///
/// ```
/// use std::time::Duration;
/// use rowscope_engine::Config;
///
/// let config = Config::default()
///     .with_estimate_threshold(100_000)
///     .with_cache_ttl(Some(Duration::from_secs(30)));
/// assert!(config.cache_enabled);
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Catalog estimate above which counts are estimated instead of exact.
    pub estimate_threshold: u64,
    /// Schema applied to tables that don't name one. `None` leaves them
    /// unqualified so the connection's `search_path` decides.
    pub default_schema: Option<String>,
    /// Whether count results are cached and deduplicated.
    pub cache_enabled: bool,
    /// How long a cached count stays fresh. `None` keeps it until invalidated.
    pub cache_ttl: Option<Duration>,
    /// Maximum number of cached counts.
    pub cache_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            estimate_threshold: THRESHOLD_COUNT,
            default_schema: None,
            cache_enabled: true,
            cache_ttl: Some(Duration::from_secs(300)),
            cache_capacity: 1024,
        }
    }
}

impl Config {
    /// Creates a configuration with caching turned off.
    #[must_use]
    pub fn uncached() -> Self {
        Self {
            cache_enabled: false,
            ..Self::default()
        }
    }

    /// Sets the estimate threshold.
    #[must_use]
    pub fn with_estimate_threshold(mut self, threshold: u64) -> Self {
        self.estimate_threshold = threshold;
        self
    }

    /// Sets the default schema.
    #[must_use]
    pub fn with_default_schema(mut self, schema: impl Into<String>) -> Self {
        self.default_schema = Some(schema.into());
        self
    }

    /// Enables or disables caching.
    #[must_use]
    pub fn with_cache(mut self, enabled: bool) -> Self {
        self.cache_enabled = enabled;
        self
    }

    /// Sets the cache time-to-live.
    #[must_use]
    pub fn with_cache_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Sets the cache capacity.
    #[must_use]
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// Builds the statement estimator these settings describe.
    #[must_use]
    pub fn estimator(&self) -> RowCountEstimator {
        let estimator = RowCountEstimator::new().with_threshold(self.estimate_threshold);
        match &self.default_schema {
            Some(schema) => estimator.with_default_schema(schema.clone()),
            None => estimator,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rowscope_common::{CountRequest, TableDescriptor};

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.estimate_threshold, 50_000);
        assert!(config.cache_enabled);
        assert!(config.default_schema.is_none());
        assert!(!Config::uncached().cache_enabled);
    }

    #[test]
    fn test_estimator_follows_config() {
        let estimator = Config::default()
            .with_estimate_threshold(10)
            .with_default_schema("app")
            .estimator();
        assert_eq!(estimator.threshold(), 10);

        let bare = CountRequest::new(TableDescriptor::new(1, "t"));
        let sql = estimator.build_statement(&bare);
        assert!(sql.contains("\"app\".\"t\""));
        assert!(sql.contains("when estimate > 10 then"));

        // An explicit schema wins over the configured default
        let qualified = CountRequest::new(TableDescriptor::new(1, "t").with_schema("public"));
        let sql = estimator.build_statement(&qualified);
        assert!(sql.contains("\"public\".\"t\""));
        assert!(!sql.contains("\"app\""));
    }

    #[test]
    fn test_estimator_without_default_schema_is_unqualified() {
        let sql = Config::default()
            .estimator()
            .build_statement(&CountRequest::new(TableDescriptor::new(1, "t")));
        assert!(sql.contains("from \"t\""));
    }
}
