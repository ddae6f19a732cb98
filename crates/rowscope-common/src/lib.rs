//! # rowscope-common
//!
//! Foundation layer for Rowscope: request/result types, errors, and utilities.
//!
//! This crate provides the building blocks shared by all other Rowscope
//! crates. It has no internal dependencies and should be kept minimal.
//!
//! ## Modules
//!
//! - [`types`] - Core type definitions (TableId, TableDescriptor, FilterClause, CountRequest, etc.)
//! - [`utils`] - Utility types (errors)
//!
//! [`CancellationToken`] is `tokio_util`'s token, re-exported so callers
//! don't need a direct dependency to cancel a count.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod types;
pub mod utils;

// Re-export commonly used types at crate root
pub use types::{
    ConnectionId, CountRequest, CountResult, FilterClause, FilterOperator, TableDescriptor,
    TableId,
};
pub use tokio_util::sync::CancellationToken;
pub use utils::error::{Error, ExecutionError, Result};
