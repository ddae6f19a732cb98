//! Which counting path a statement takes.

use serde::Serialize;
use std::fmt;

/// The branch a count statement resolves to on the server.
///
/// This mirrors the `case` expression emitted by
/// [`RowCountEstimator`](super::RowCountEstimator), so callers can reason
/// about a statement without running it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CountStrategy {
    /// `count(*)` with the request's filters.
    Exact,
    /// `pg_class.reltuples`, read as-is.
    CatalogEstimate,
    /// `Plan Rows` from `EXPLAIN` of the filtered select.
    PlannerEstimate,
}

impl CountStrategy {
    /// Picks the branch for a catalog estimate.
    ///
    /// A `catalog_estimate` of `-1` means the table was never analyzed.
    #[must_use]
    pub fn select(
        catalog_estimate: f64,
        has_filters: bool,
        enforce_exact: bool,
        threshold: u64,
    ) -> Self {
        if enforce_exact {
            return Self::Exact;
        }
        if catalog_estimate == -1.0 {
            Self::PlannerEstimate
        } else if catalog_estimate > threshold as f64 {
            if has_filters {
                Self::PlannerEstimate
            } else {
                Self::CatalogEstimate
            }
        } else {
            Self::Exact
        }
    }

    /// Returns whether this branch reports an estimate.
    #[must_use]
    pub fn is_estimate(&self) -> bool {
        !matches!(self, Self::Exact)
    }

    /// Returns a short label.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::CatalogEstimate => "catalog_estimate",
            Self::PlannerEstimate => "planner_estimate",
        }
    }

    /// Returns a one-line explanation for display.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Exact => "count(*) over the filtered table",
            Self::CatalogEstimate => "reltuples from pg_class",
            Self::PlannerEstimate => "planner row estimate of the filtered select",
        }
    }
}

impl fmt::Display for CountStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
