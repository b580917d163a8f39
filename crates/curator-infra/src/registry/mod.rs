//! Registry lookup implementations.

pub mod catalog;

pub use catalog::CatalogRegistry;
