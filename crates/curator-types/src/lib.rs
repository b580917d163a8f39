//! Shared domain types for the collection curator.
//!
//! Collection definitions, findings and reports, resolution results,
//! validator configuration and their error types.
//!
//! No infrastructure dependencies -- only serde, semver and thiserror.

pub mod collection;
pub mod config;
pub mod discovery;
pub mod error;
pub mod report;
pub mod resolution;
