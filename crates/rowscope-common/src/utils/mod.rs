//! Utility types shared across crates.

pub mod error;
