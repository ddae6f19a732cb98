//! # Rowscope
//!
//! Exact and estimated table row counts for database consoles.
//!
//! Counting every row of a large table just to label a data grid is slow, so
//! Rowscope builds a single statement that lets the server decide. Tables
//! under the threshold get an exact `count(*)`. Above it the count comes from
//! `pg_class.reltuples`, or from the planner when filters apply. The result
//! says which kind of number it is.
//!
//! Start with [`Console`]: it owns the configuration, your [`SqlExecutor`]
//! and a shared [`QueryCache`]. Sessions bind a connection and, optionally,
//! an [`ImpersonationRole`].
//!
//! ## Quick Start
//!
//! ```rust
//! use async_trait::async_trait;
//! use rowscope::{
//!     CancellationToken, Config, Console, CountRequest, ExecutionError, QueryRows, SqlExecutor,
//!     SqlRequest, TableDescriptor,
//! };
//!
//! // Stand-in for a real connection pool
//! struct Fixed;
//!
//! #[async_trait]
//! impl SqlExecutor for Fixed {
//!     async fn execute(&self, _request: SqlRequest) -> Result<QueryRows, ExecutionError> {
//!         let row = serde_json::json!({ "count": 1_500_000, "is_estimate": true });
//!         Ok(vec![row.as_object().cloned().unwrap_or_default()])
//!     }
//! }
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let console = Console::new(Config::default(), Fixed);
//! let session = console.session().with_connection("my-project");
//!
//! let request = CountRequest::new(TableDescriptor::new(16_384, "events").with_schema("public"));
//! let result = session.count_rows(&request, &CancellationToken::new()).await?;
//!
//! let result = result.expect("table and connection are set");
//! assert_eq!(result.count, 1_500_000);
//! assert!(result.is_estimate);
//! # Ok::<(), rowscope::Error>(())
//! # }).unwrap();
//! ```
//!
//! ## Crates
//!
//! | Crate | Contents |
//! | ----- | -------- |
//! | `rowscope-common` | Request/result types, errors, cancellation |
//! | `rowscope-core` | SQL quoting, query builder, statement estimator |
//! | `rowscope-engine` | Console, sessions, executor trait, impersonation, cache |

// Re-export the main console API
pub use rowscope_engine::{
    CacheKey, CacheStats, CachingRowCounter, Config, Console, ImpersonationRole, QueryCache,
    QueryRows, RoleImpersonationLayer, Row, RowCounter, Session, SharedExecutor, SqlExecutor,
    SqlRequest, decode_count, wrap_with_role_impersonation,
};

// Re-export statement building, for callers that run SQL themselves
pub use rowscope_core::{
    CountStrategy, NestedStatement, QualifiedName, Query, RowCountEstimator, SelectQuery,
    THRESHOLD_COUNT, quote_ident, quote_literal,
};

// Re-export the data model
pub use rowscope_common::{
    CancellationToken, ConnectionId, CountRequest, CountResult, Error, ExecutionError,
    FilterClause, FilterOperator, Result, TableDescriptor, TableId,
};
