//! SQL executor abstraction.
//!
//! Rowscope never opens database connections itself. Whatever transport the
//! console uses (an HTTP query endpoint, a pooled driver, a test double)
//! implements [`SqlExecutor`].

use std::sync::Arc;

use async_trait::async_trait;
use rowscope_common::{ConnectionId, ExecutionError};

/// A result row, keyed by column name.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Rows returned by the last statement of a batch.
pub type QueryRows = Vec<Row>;

/// A statement to run on a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlRequest {
    /// Connection the statement is routed to.
    pub connection: ConnectionId,
    /// Statement text. May contain several `;`-separated statements.
    pub sql: String,
    /// Label identifying the logical query, for transport-side logging.
    pub query_key: Option<String>,
    /// Whether `sql` has been wrapped to run under an impersonated role.
    pub is_role_impersonation_enabled: bool,
}

impl SqlRequest {
    /// Creates a request with no query key and no impersonation.
    #[must_use]
    pub fn new(connection: ConnectionId, sql: impl Into<String>) -> Self {
        Self {
            connection,
            sql: sql.into(),
            query_key: None,
            is_role_impersonation_enabled: false,
        }
    }

    /// Sets the query key label.
    #[must_use]
    pub fn with_query_key(mut self, key: Option<String>) -> Self {
        self.query_key = key;
        self
    }
}

/// Runs SQL against a remote database.
///
/// Implementations own connection pooling and transport errors. Dropping the
/// returned future abandons the call.
#[async_trait]
pub trait SqlExecutor: Send + Sync {
    /// Executes `request` and returns the rows of its last statement.
    async fn execute(&self, request: SqlRequest) -> Result<QueryRows, ExecutionError>;
}

/// An executor shared between a console and its sessions.
pub type SharedExecutor = Arc<dyn SqlExecutor>;

#[async_trait]
impl<E: SqlExecutor + ?Sized> SqlExecutor for Arc<E> {
    async fn execute(&self, request: SqlRequest) -> Result<QueryRows, ExecutionError> {
        (**self).execute(request).await
    }
}
