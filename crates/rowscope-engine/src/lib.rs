//! # rowscope-engine
//!
//! The main entry point for Rowscope: runs count statements through a
//! pluggable executor, with role impersonation and query caching layered
//! around the core call.
//!
//! ## Modules
//!
//! - [`console`] - Console struct holding configuration, executor, and cache
//! - [`session`] - Per-connection, per-role sessions
//! - [`config`] - Configuration options
//! - [`executor`] - The `SqlExecutor` trait and row types
//! - [`impersonation`] - Role impersonation wrapper and executor layer
//! - [`cache`] - Deduplicating query cache
//! - [`counter`] - Row counting on top of an executor, cached and uncached

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod cache;
pub mod config;
pub mod console;
pub mod counter;
pub mod executor;
pub mod impersonation;
pub mod session;

pub use cache::{CacheKey, CacheStats, QueryCache};
pub use config::Config;
pub use console::Console;
pub use counter::{CachingRowCounter, RowCounter, decode_count};
pub use executor::{QueryRows, Row, SharedExecutor, SqlExecutor, SqlRequest};
pub use impersonation::{ImpersonationRole, RoleImpersonationLayer, wrap_with_role_impersonation};
pub use session::Session;
