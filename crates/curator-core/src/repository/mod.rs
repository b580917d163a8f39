//! Collaborator trait definitions (ports).
//!
//! The package registry and the definition store are owned by other
//! systems. These traits are the only way the validator reaches them;
//! implementations live in `curator-infra` or in the embedding service.

pub mod registry;
pub mod store;
