//! Immutable `select` builder.
//!
//! ```
//! use rowscope_common::{FilterClause, FilterOperator};
//! use rowscope_core::sql::{QualifiedName, Query};
//!
//! let sql = Query::from(QualifiedName::new("users").with_schema("public"))
//!     .count()
//!     .filter(&FilterClause::new("age", FilterOperator::Gte, "21"))
//!     .to_sql();
//!
//! assert_eq!(sql, r#"select count(*) from "public"."users" where "age" >= '21';"#);
//! ```

use smallvec::SmallVec;

use rowscope_common::types::IsTarget;
use rowscope_common::{FilterClause, FilterOperator};

use super::ident::{QualifiedName, quote_ident};
use super::literal::quote_literal;

/// Entry point of the builder chain.
pub struct Query;

impl Query {
    /// Starts a query against `target`.
    #[must_use]
    pub fn from(target: QualifiedName) -> FromClause {
        FromClause { target }
    }
}

/// A query with a target but no projection yet.
#[derive(Debug, Clone)]
pub struct FromClause {
    target: QualifiedName,
}

impl FromClause {
    /// Projects every column (`select *`).
    #[must_use]
    pub fn select_all(self) -> SelectQuery {
        SelectQuery::new(self.target, Projection::All)
    }

    /// Projects the row count (`select count(*)`).
    #[must_use]
    pub fn count(self) -> SelectQuery {
        SelectQuery::new(self.target, Projection::CountAll)
    }
}

/// What a [`SelectQuery`] returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    /// `*`
    All,
    /// `count(*)`
    CountAll,
}

impl Projection {
    fn as_sql(self) -> &'static str {
        match self {
            Self::All => "*",
            Self::CountAll => "count(*)",
        }
    }
}

/// Right-hand side of a rendered condition.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Operand {
    Literal(String),
    List(Vec<String>),
    Keyword(IsTarget),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Condition {
    column: String,
    operator: FilterOperator,
    operand: Operand,
}

impl Condition {
    /// Builds the condition for an active filter.
    fn from_filter(filter: &FilterClause) -> Option<Self> {
        if !filter.is_active() {
            return None;
        }
        let value = filter.value.as_deref().unwrap_or_default();
        let operand = match filter.operator {
            FilterOperator::In => Operand::List(
                filter
                    .in_values()
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
            ),
            // Unknown `is` operands stay literals; the server rejects them
            FilterOperator::Is => IsTarget::parse(value)
                .map(Operand::Keyword)
                .unwrap_or_else(|| Operand::Literal(value.to_string())),
            _ => Operand::Literal(value.to_string()),
        };
        Some(Self {
            column: filter.column.clone(),
            operator: filter.operator,
            operand,
        })
    }

    fn render(&self, out: &mut String) {
        out.push_str(&quote_ident(&self.column));
        out.push(' ');
        out.push_str(self.operator.as_sql());
        out.push(' ');
        match &self.operand {
            Operand::Literal(value) => out.push_str(&quote_literal(value)),
            Operand::List(items) => {
                out.push('(');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    out.push_str(&quote_literal(item));
                }
                out.push(')');
            }
            Operand::Keyword(target) => out.push_str(target.as_sql()),
        }
    }
}

/// A `select` statement over one relation with AND-ed column filters.
///
/// Every method takes `self` and returns a new query; there is no shared
/// mutable state between a query and the ones derived from it.
#[derive(Debug, Clone)]
pub struct SelectQuery {
    target: QualifiedName,
    projection: Projection,
    conditions: SmallVec<[Condition; 4]>,
}

impl SelectQuery {
    fn new(target: QualifiedName, projection: Projection) -> Self {
        Self {
            target,
            projection,
            conditions: SmallVec::new(),
        }
    }

    /// Adds a filter. Inactive filters (no value) are ignored.
    #[must_use]
    pub fn filter(mut self, filter: &FilterClause) -> Self {
        if let Some(condition) = Condition::from_filter(filter) {
            self.conditions.push(condition);
        }
        self
    }

    /// Adds every filter in order.
    #[must_use]
    pub fn filters<'a>(self, filters: impl IntoIterator<Item = &'a FilterClause>) -> Self {
        filters.into_iter().fold(self, SelectQuery::filter)
    }

    /// Returns the projection.
    #[must_use]
    pub fn projection(&self) -> Projection {
        self.projection
    }

    /// Returns the number of conditions in the WHERE clause.
    #[must_use]
    pub fn condition_count(&self) -> usize {
        self.conditions.len()
    }

    /// Renders the statement without a terminator, for use as a subquery.
    #[must_use]
    pub fn to_subquery(&self) -> String {
        let mut out = format!("select {} from {}", self.projection.as_sql(), self.target);
        for (i, condition) in self.conditions.iter().enumerate() {
            out.push_str(if i == 0 { " where " } else { " and " });
            condition.render(&mut out);
        }
        out
    }

    /// Renders the complete statement, terminated with `;`.
    #[must_use]
    pub fn to_sql(&self) -> String {
        let mut out = self.to_subquery();
        out.push(';');
        out
    }
}
