//! Validation logic and collaborator traits for collection definitions.
//!
//! This crate defines the ports (registry lookup, definition store, candidate
//! source) that the infrastructure layer implements. It depends only on
//! `curator-types`, never on `curator-infra` or any filesystem/network IO.

pub mod collection;
pub mod discovery;
pub mod repository;
