//! Core type definitions for Rowscope.
//!
//! This module contains the fundamental types that flow through a count request:
//! - Identifier types ([`TableId`], [`ConnectionId`])
//! - Table and filter descriptions ([`TableDescriptor`], [`FilterClause`], [`FilterOperator`])
//! - Request/response types ([`CountRequest`], [`CountResult`])

mod count;
mod filter;
mod id;
mod table;

pub use count::{CountRequest, CountResult};
pub use filter::{FilterClause, FilterOperator, IsTarget};
pub use id::{ConnectionId, TableId};
pub use table::TableDescriptor;
