//! # rowscope-core
//!
//! Core layer for Rowscope: SQL text primitives, an immutable query builder,
//! and the row-count estimator that turns a [`CountRequest`] into a statement.
//!
//! This crate never talks to a database. It depends only on `rowscope-common`.
//!
//! ## Modules
//!
//! - [`sql`] - Identifier/literal quoting, nested statements, query builder
//! - [`estimator`] - Row-count statement construction and strategy selection
//!
//! [`CountRequest`]: rowscope_common::CountRequest

pub mod estimator;
pub mod sql;

// Re-export commonly used types
pub use estimator::{COUNT_ESTIMATE_FUNCTION, CountStrategy, RowCountEstimator, THRESHOLD_COUNT};
pub use sql::{NestedStatement, QualifiedName, Query, SelectQuery, quote_ident, quote_literal};
