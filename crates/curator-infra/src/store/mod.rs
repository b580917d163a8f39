//! Definition store implementations.

pub mod filesystem;

pub use filesystem::FsDefinitionStore;
