//! Row-count statement construction.
//!
//! A console grid wants a total row count for the current table and filters,
//! but `count(*)` over a large table is a full scan. The statement built here
//! lets the server pick the cheapest acceptable answer:
//!
//! ```text
//!   reltuples = -1 (never analyzed) ──────────────► planner estimate
//!   reltuples > threshold, with filters ──────────► planner estimate
//!   reltuples > threshold, no filters ────────────► reltuples
//!   otherwise ────────────────────────────────────► count(*)
//! ```
//!
//! Callers that must have an exact number set `enforce_exact_count` and get
//! a plain `count(*)`.

mod strategy;

pub use strategy::CountStrategy;

use rowscope_common::{CountRequest, TableDescriptor};

use crate::sql::{NestedStatement, QualifiedName, Query};

/// Catalog estimate above which tables are no longer counted exactly.
pub const THRESHOLD_COUNT: u64 = 50_000;

/// Temporary function returning the planner's row estimate for a query.
///
/// Created in `pg_temp`, so it only lives as long as the session and needs
/// no privileges beyond `TEMP`.
pub const COUNT_ESTIMATE_FUNCTION: &str = "create or replace function pg_temp.count_estimate(
  query text
) returns integer language plpgsql as $$
declare
  plan jsonb;
begin
  execute 'explain (format json) ' || query into plan;
  return plan->0->'Plan'->'Plan Rows';
end;
$$;";

/// Builds row-count statements.
///
/// The output is a pure function of the request and the estimator's fixed
/// settings: building the same request twice yields identical text.
#[derive(Debug, Clone)]
pub struct RowCountEstimator {
    threshold: u64,
    default_schema: Option<String>,
}

impl Default for RowCountEstimator {
    fn default() -> Self {
        Self::new()
    }
}

impl RowCountEstimator {
    /// Creates an estimator with the default threshold and no default schema.
    #[must_use]
    pub fn new() -> Self {
        Self {
            threshold: THRESHOLD_COUNT,
            default_schema: None,
        }
    }

    /// Sets the catalog estimate above which counts are estimated.
    #[must_use]
    pub fn with_threshold(mut self, threshold: u64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Sets the schema used for tables that don't name one.
    ///
    /// Without it such tables stay unqualified and resolve through the
    /// connection's `search_path`.
    #[must_use]
    pub fn with_default_schema(mut self, schema: impl Into<String>) -> Self {
        self.default_schema = Some(schema.into());
        self
    }

    /// Returns the estimate threshold.
    #[must_use]
    pub fn threshold(&self) -> u64 {
        self.threshold
    }

    /// Builds the statement for `request`.
    ///
    /// Returns an empty string when the request has no table; there is
    /// nothing to execute in that case.
    #[must_use]
    pub fn build_statement(&self, request: &CountRequest) -> String {
        let Some(table) = request.table.as_ref() else {
            return String::new();
        };

        let sql = if request.enforce_exact_count {
            self.exact_statement(table, request)
        } else {
            self.estimated_statement(table, request)
        };
        tracing::debug!(table = %table.name, oid = %table.id, "built row count statement");
        sql
    }

    /// Returns the branch the statement for `request` takes when the table's
    /// `reltuples` equals `catalog_estimate`, or `None` without a table.
    #[must_use]
    pub fn strategy_for(&self, request: &CountRequest, catalog_estimate: f64) -> Option<CountStrategy> {
        request.table.as_ref()?;
        Some(CountStrategy::select(
            catalog_estimate,
            request.has_active_filters(),
            request.enforce_exact_count,
            self.threshold,
        ))
    }

    fn target(&self, table: &TableDescriptor) -> QualifiedName {
        let name = QualifiedName::new(table.name.clone());
        match table.schema.as_ref().or(self.default_schema.as_ref()) {
            Some(schema) => name.with_schema(schema.clone()),
            None => name,
        }
    }

    fn exact_statement(&self, table: &TableDescriptor, request: &CountRequest) -> String {
        let count = Query::from(self.target(table))
            .count()
            .filters(&request.filters)
            .to_subquery();
        format!("select ({count}) as count, false as is_estimate;")
    }

    fn estimated_statement(&self, table: &TableDescriptor, request: &CountRequest) -> String {
        let select = Query::from(self.target(table))
            .select_all()
            .filters(&request.filters);
        let count = Query::from(self.target(table))
            .count()
            .filters(&request.filters)
            .to_subquery();

        let planner = format!(
            "(select pg_temp.count_estimate({}))",
            NestedStatement::new(select.to_sql()).to_literal()
        );
        // Filters invalidate reltuples, so large filtered tables ask the planner too
        let large = if select.condition_count() > 0 {
            planner.clone()
        } else {
            "estimate::bigint".to_string()
        };
        let threshold = self.threshold;
        let oid = table.id;

        format!(
            "{COUNT_ESTIMATE_FUNCTION}

with approximation as (
  select reltuples as estimate
  from pg_class
  where oid = {oid}
)
select
  case
    when estimate = -1 then {planner}
    when estimate > {threshold} then {large}
    else ({count})
  end as count,
  estimate = -1 or estimate > {threshold} as is_estimate
from approximation;"
        )
    }
}
