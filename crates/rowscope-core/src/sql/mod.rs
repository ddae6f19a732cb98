//! SQL text building.
//!
//! Everything in here produces Postgres-dialect text:
//!
//! - [`quote_ident`] / [`QualifiedName`] for identifiers
//! - [`quote_literal`] / [`NestedStatement`] for string literals
//! - [`Query`] / [`SelectQuery`] for `select` statements with column filters

mod ident;
mod literal;
mod query;

pub use ident::{QualifiedName, quote_ident};
pub use literal::{NestedStatement, quote_literal};
pub use query::{FromClause, Projection, Query, SelectQuery};
