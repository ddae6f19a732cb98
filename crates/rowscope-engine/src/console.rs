//! Console: the top-level handle owning configuration, executor, and cache.

use std::sync::Arc;

use rowscope_common::{ConnectionId, CountRequest, CountResult, TableId};
use rowscope_core::RowCountEstimator;

use crate::cache::{CacheStats, QueryCache};
use crate::config::Config;
use crate::executor::{SharedExecutor, SqlExecutor};
use crate::session::Session;

/// The main Rowscope handle.
///
/// A console is cheap to share behind an `Arc`; sessions created from it
/// share its executor and cache.
pub struct Console {
    /// Console configuration.
    config: Config,
    /// Statement builder derived from the configuration.
    estimator: RowCountEstimator,
    /// Executor every session runs through.
    executor: SharedExecutor,
    /// Count cache shared by all sessions.
    cache: Arc<QueryCache<CountResult>>,
}

impl Console {
    /// Creates a console over `executor`.
    ///
    /// # Examples
    ///
    /// ```
    /// use async_trait::async_trait;
    /// use rowscope_common::ExecutionError;
    /// use rowscope_engine::{Config, Console, QueryRows, SqlExecutor, SqlRequest};
    ///
    /// struct Offline;
    ///
    /// #[async_trait]
    /// impl SqlExecutor for Offline {
    ///     async fn execute(&self, _request: SqlRequest) -> Result<QueryRows, ExecutionError> {
    ///         Err(ExecutionError::new("offline"))
    ///     }
    /// }
    ///
    /// let console = Console::new(Config::default(), Offline);
    /// let session = console.session().with_connection("my-project");
    /// assert!(session.connection().is_some());
    /// ```
    pub fn new(config: Config, executor: impl SqlExecutor + 'static) -> Self {
        Self::with_shared_executor(config, Arc::new(executor))
    }

    /// Creates a console over an executor that is already shared.
    pub fn with_shared_executor(config: Config, executor: SharedExecutor) -> Self {
        let cache = Arc::new(QueryCache::new(config.cache_capacity, config.cache_ttl));
        Self {
            estimator: config.estimator(),
            config,
            executor,
            cache,
        }
    }

    /// Creates a session with no connection and no impersonated role.
    #[must_use]
    pub fn session(&self) -> Session {
        let cache = self.config.cache_enabled.then(|| Arc::clone(&self.cache));
        Session::new(self.estimator.clone(), Arc::clone(&self.executor), cache)
    }

    /// Returns the statement a request would run.
    #[must_use]
    pub fn statement(&self, request: &CountRequest) -> String {
        self.estimator.build_statement(request)
    }

    /// Drops cached counts for a table, e.g. after rows were edited.
    pub fn invalidate_table(&self, connection: &ConnectionId, table_id: TableId) {
        tracing::debug!(connection = %connection, table = %table_id, "invalidating cached counts");
        self.cache.invalidate_table(connection, table_id);
    }

    /// Drops every cached count.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Returns cache statistics.
    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }
}
