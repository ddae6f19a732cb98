//! CLI command implementations.

pub mod impersonate;
pub mod request;
pub mod sql;
pub mod strategy;
