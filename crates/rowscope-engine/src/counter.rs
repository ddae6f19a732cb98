//! Row counting on top of an executor.
//!
//! [`RowCounter`] builds the statement, runs it, and decodes the first row.
//! [`CachingRowCounter`] puts a [`QueryCache`] in front of it.

use std::sync::Arc;

use serde_json::Value;

use rowscope_common::{
    CancellationToken, ConnectionId, CountRequest, CountResult, Error, Result,
};
use rowscope_core::RowCountEstimator;

use crate::cache::{CacheKey, QueryCache};
use crate::executor::{Row, SqlExecutor, SqlRequest};
use crate::impersonation::ImpersonationRole;

/// Runs count statements through an executor.
pub struct RowCounter<E> {
    estimator: RowCountEstimator,
    executor: E,
}

impl<E: SqlExecutor> RowCounter<E> {
    /// Creates a counter.
    pub fn new(estimator: RowCountEstimator, executor: E) -> Self {
        Self {
            estimator,
            executor,
        }
    }

    /// Returns the statement estimator.
    pub fn estimator(&self) -> &RowCountEstimator {
        &self.estimator
    }

    /// Counts rows for `request` on `connection`.
    ///
    /// Returns `Ok(None)` when the request has no table, without contacting
    /// the executor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Execution`] with the executor's error unchanged,
    /// [`Error::Cancelled`] if `cancel` fires first, or
    /// [`Error::MalformedResult`] if the rows don't hold a count.
    pub async fn execute(
        &self,
        connection: &ConnectionId,
        request: &CountRequest,
        query_key: Option<String>,
        cancel: &CancellationToken,
    ) -> Result<Option<CountResult>> {
        let sql = self.estimator.build_statement(request);
        if sql.is_empty() {
            return Ok(None);
        }
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let sql_request = SqlRequest::new(connection.clone(), sql).with_query_key(query_key);
        let rows = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(Error::Cancelled),
            rows = self.executor.execute(sql_request) => rows?,
        };

        let result = decode_count(&rows)?;
        tracing::debug!(
            connection = %connection,
            count = result.count,
            is_estimate = result.is_estimate,
            "counted rows"
        );
        Ok(Some(result))
    }
}

/// A [`RowCounter`] behind a [`QueryCache`].
pub struct CachingRowCounter<E> {
    inner: RowCounter<E>,
    cache: Arc<QueryCache<CountResult>>,
    role: Option<ImpersonationRole>,
}

impl<E: SqlExecutor> CachingRowCounter<E> {
    /// Wraps `inner`. `role` is the role the inner executor impersonates and
    /// becomes part of every cache key.
    pub fn new(
        inner: RowCounter<E>,
        cache: Arc<QueryCache<CountResult>>,
        role: Option<ImpersonationRole>,
    ) -> Self {
        Self { inner, cache, role }
    }

    /// Counts rows through the cache.
    ///
    /// Nothing is issued unless both `connection` and the request's table
    /// are known; `Ok(None)` is returned instead.
    ///
    /// # Errors
    ///
    /// Same as [`RowCounter::execute`]. Errors are not cached.
    pub async fn execute(
        &self,
        connection: Option<&ConnectionId>,
        request: &CountRequest,
        cancel: &CancellationToken,
    ) -> Result<Option<CountResult>> {
        let Some(connection) = connection else {
            return Ok(None);
        };
        let Some(key) = CacheKey::new(connection, request, self.role.as_ref()) else {
            return Ok(None);
        };

        let lookup = self.cache.get_or_try_insert_with(&key, || async {
            self.inner
                .execute(connection, request, Some(key.label()), cancel)
                .await?
                .ok_or_else(|| Error::Internal("count statement was empty".to_string()))
        });
        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(Error::Cancelled),
            result = lookup => result?,
        };
        Ok(Some(result))
    }
}

/// Decodes `{count, is_estimate}` from the first row.
///
/// `count` may be an integer, a float (`reltuples` is `real`) or a numeric
/// string; `is_estimate` defaults to `false` when missing.
///
/// # Errors
///
/// Returns [`Error::MalformedResult`] if there is no row or no numeric
/// `count` column.
pub fn decode_count(rows: &[Row]) -> Result<CountResult> {
    let row = rows
        .first()
        .ok_or_else(|| Error::MalformedResult("count statement returned no rows".to_string()))?;

    let count = row
        .get("count")
        .ok_or_else(|| Error::MalformedResult("missing count column".to_string()))?;
    let count = json_to_count(count)
        .ok_or_else(|| Error::MalformedResult(format!("count is not numeric: {count}")))?;

    let is_estimate = match row.get("is_estimate") {
        None | Some(Value::Null) => false,
        Some(value) => json_to_bool(value).unwrap_or_else(|| {
            tracing::warn!(%value, "unrecognized is_estimate value, assuming exact");
            false
        }),
    };

    Ok(CountResult { count, is_estimate })
}

fn json_to_count(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(round_finite)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(round_finite))
        }
        _ => None,
    }
}

fn round_finite(value: f64) -> Option<i64> {
    value.is_finite().then(|| value.round() as i64)
}

fn json_to_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "t" | "true" => Some(true),
            "f" | "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}
