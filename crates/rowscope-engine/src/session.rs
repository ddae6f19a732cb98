//! Session management.

use std::sync::Arc;

use rowscope_common::{CancellationToken, ConnectionId, CountRequest, CountResult, Result};
use rowscope_core::RowCountEstimator;

use crate::cache::{CacheKey, QueryCache};
use crate::counter::{CachingRowCounter, RowCounter};
use crate::executor::SharedExecutor;
use crate::impersonation::{ImpersonationRole, RoleImpersonationLayer};

/// A session bound to one connection and, optionally, one impersonated role.
pub struct Session {
    /// Connection counts are issued against.
    connection: Option<ConnectionId>,
    /// Role statements run as.
    role: Option<ImpersonationRole>,
    estimator: RowCountEstimator,
    executor: SharedExecutor,
    /// Shared cache, absent when caching is disabled.
    cache: Option<Arc<QueryCache<CountResult>>>,
}

impl Session {
    /// Creates a new session.
    pub(crate) fn new(
        estimator: RowCountEstimator,
        executor: SharedExecutor,
        cache: Option<Arc<QueryCache<CountResult>>>,
    ) -> Self {
        Self {
            connection: None,
            role: None,
            estimator,
            executor,
            cache,
        }
    }

    /// Binds the session to a connection.
    #[must_use]
    pub fn with_connection(mut self, connection: impl Into<ConnectionId>) -> Self {
        self.connection = Some(connection.into());
        self
    }

    /// Runs every statement as `role`.
    #[must_use]
    pub fn with_role(mut self, role: ImpersonationRole) -> Self {
        self.role = Some(role);
        self
    }

    /// Returns the bound connection.
    #[must_use]
    pub fn connection(&self) -> Option<&ConnectionId> {
        self.connection.as_ref()
    }

    /// Returns the impersonated role.
    #[must_use]
    pub fn role(&self) -> Option<&ImpersonationRole> {
        self.role.as_ref()
    }

    /// Returns the statement `request` would run, before impersonation.
    #[must_use]
    pub fn statement(&self, request: &CountRequest) -> String {
        self.estimator.build_statement(request)
    }

    /// Counts rows for `request`.
    ///
    /// Returns `Ok(None)` without issuing anything when the session has no
    /// connection or the request has no table.
    ///
    /// # Errors
    ///
    /// Returns the executor's error unchanged, [`Error::Cancelled`] if
    /// `cancel` fires before a result arrives, or
    /// [`Error::MalformedResult`] for rows without a count.
    ///
    /// [`Error::Cancelled`]: rowscope_common::Error::Cancelled
    /// [`Error::MalformedResult`]: rowscope_common::Error::MalformedResult
    pub async fn count_rows(
        &self,
        request: &CountRequest,
        cancel: &CancellationToken,
    ) -> Result<Option<CountResult>> {
        let Some(connection) = self.connection.as_ref() else {
            tracing::trace!("no connection bound, count not issued");
            return Ok(None);
        };

        let executor = RoleImpersonationLayer::new(Arc::clone(&self.executor), self.role.clone());
        let counter = RowCounter::new(self.estimator.clone(), executor);

        match &self.cache {
            Some(cache) => {
                CachingRowCounter::new(counter, Arc::clone(cache), self.role.clone())
                    .execute(Some(connection), request, cancel)
                    .await
            }
            None => {
                let key = CacheKey::new(connection, request, self.role.as_ref()).map(|k| k.label());
                counter.execute(connection, request, key, cancel).await
            }
        }
    }
}
