//! Count request and result types.

use serde::{Deserialize, Serialize};

use super::filter::FilterClause;
use super::table::TableDescriptor;

/// Everything needed to build a row-count statement.
///
/// The generated SQL is a pure function of this value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CountRequest {
    /// Target table. Without one there is nothing to count.
    #[serde(default)]
    pub table: Option<TableDescriptor>,
    /// Column filters, in display order.
    #[serde(default)]
    pub filters: Vec<FilterClause>,
    /// Skip estimation and always run an exact `count(*)`.
    #[serde(default)]
    pub enforce_exact_count: bool,
}

impl CountRequest {
    /// Creates a request for the given table with no filters.
    #[must_use]
    pub fn new(table: TableDescriptor) -> Self {
        Self {
            table: Some(table),
            filters: Vec::new(),
            enforce_exact_count: false,
        }
    }

    /// Adds a filter.
    #[must_use]
    pub fn with_filter(mut self, filter: FilterClause) -> Self {
        self.filters.push(filter);
        self
    }

    /// Replaces the filter list.
    #[must_use]
    pub fn with_filters(mut self, filters: impl IntoIterator<Item = FilterClause>) -> Self {
        self.filters = filters.into_iter().collect();
        self
    }

    /// Sets whether an exact count is required.
    #[must_use]
    pub fn with_exact_count(mut self, enforce: bool) -> Self {
        self.enforce_exact_count = enforce;
        self
    }

    /// Iterates over the filters that contribute to the WHERE clause.
    pub fn active_filters(&self) -> impl Iterator<Item = &FilterClause> {
        self.filters.iter().filter(|f| f.is_active())
    }

    /// Returns whether any filter contributes to the WHERE clause.
    #[must_use]
    pub fn has_active_filters(&self) -> bool {
        self.active_filters().next().is_some()
    }
}

/// Outcome of a count request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CountResult {
    /// Number of rows (exact or estimated).
    pub count: i64,
    /// Whether `count` came from the catalog or the planner rather than `count(*)`.
    pub is_estimate: bool,
}

impl CountResult {
    /// Creates an exact result.
    #[must_use]
    pub const fn exact(count: i64) -> Self {
        Self {
            count,
            is_estimate: false,
        }
    }

    /// Creates an estimated result.
    #[must_use]
    pub const fn estimated(count: i64) -> Self {
        Self {
            count,
            is_estimate: true,
        }
    }
}
