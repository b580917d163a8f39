//! Single-level collection inheritance.
//!
//! A child that declares `extends` is merged onto its parent:
//! - Parent packages come first, in parent order
//! - A child package with the same id overrides the parent's entry in place
//! - New child packages are appended in child order, numbered after the
//!   highest install order left by the overrides
//! - Metadata is taken from the child, falling back to the parent when unset
//!
//! A parent that itself extends another collection is rejected; chains are
//! limited to one level.

use std::collections::BTreeMap;

use curator_types::collection::{CollectionConfig, CollectionDefinition, CollectionRef, PackageRef};
use curator_types::error::StoreError;
use thiserror::Error;

use crate::repository::store::DefinitionStore;

/// Maximum inheritance depth (child -> parent).
pub const MAX_INHERITANCE_DEPTH: usize = 1;

#[derive(Debug, Error)]
pub enum InheritanceError {
    #[error("invalid extends reference: {0}")]
    InvalidReference(String),

    #[error("collection {0} cannot extend itself")]
    SelfReference(String),

    #[error("parent collection {0} not found")]
    ParentNotFound(String),

    #[error("inheritance depth exceeded (max 1 level): parent {parent} extends {grandparent}")]
    DepthExceeded { parent: String, grandparent: String },

    #[error("failed to load parent collection {reference}: {source}")]
    Store {
        reference: String,
        #[source]
        source: StoreError,
    },
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Compose `child` with its parent, if it declares one.
///
/// Bare `extends` ids are looked up in the child's own scope. Definitions
/// without `extends` are returned unchanged.
pub async fn compose<S: DefinitionStore>(
    child: CollectionDefinition,
    store: &S,
) -> Result<CollectionDefinition, InheritanceError> {
    let Some(raw) = child.extends.as_deref().filter(|r| !r.trim().is_empty()) else {
        return Ok(child);
    };

    let parent_ref =
        CollectionRef::parse(raw, &child.scope).map_err(InheritanceError::InvalidReference)?;
    if parent_ref.scope == child.scope && parent_ref.id == child.id {
        return Err(InheritanceError::SelfReference(child.qualified_id()));
    }

    let parent = store
        .get(&parent_ref.scope, &parent_ref.id)
        .await
        .map_err(|source| InheritanceError::Store {
            reference: parent_ref.to_string(),
            source,
        })?
        .ok_or_else(|| InheritanceError::ParentNotFound(parent_ref.to_string()))?;

    tracing::debug!(
        child = %child.qualified_id(),
        parent = %parent_ref,
        "composing collection with parent"
    );
    merge_with_parent(&parent, child)
}

/// Merge a child definition onto an already loaded parent.
///
/// Pure and deterministic: the same pair always yields the same result.
pub fn merge_with_parent(
    parent: &CollectionDefinition,
    child: CollectionDefinition,
) -> Result<CollectionDefinition, InheritanceError> {
    if let Some(grandparent) = parent.extends.as_deref().filter(|r| !r.trim().is_empty()) {
        return Err(InheritanceError::DepthExceeded {
            parent: parent.qualified_id(),
            grandparent: grandparent.to_string(),
        });
    }

    let CollectionDefinition {
        id,
        scope,
        name,
        description,
        version,
        category,
        tags,
        framework,
        icon,
        official,
        verified,
        packages: child_packages,
        config: child_config,
        extends: _,
        extra: child_extra,
    } = child;

    let packages = merge_packages(&parent.packages, child_packages);

    let mut extra = parent.extra.clone();
    extra.extend(child_extra);

    Ok(CollectionDefinition {
        id,
        scope,
        name,
        description,
        version,
        category: category.or(parent.category),
        tags: if tags.is_empty() {
            parent.tags.clone()
        } else {
            tags
        },
        framework: framework.or_else(|| parent.framework.clone()),
        icon,
        official,
        verified,
        packages,
        config: merge_config(parent.config.as_ref(), child_config),
        extends: None,
        extra,
    })
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn merge_packages(parent: &[PackageRef], child: Vec<PackageRef>) -> Vec<PackageRef> {
    let mut merged = parent.to_vec();
    let mut appended = Vec::new();

    for pkg in child {
        match merged.iter_mut().find(|p| p.package_id == pkg.package_id) {
            Some(existing) => override_package(existing, pkg),
            None => appended.push(pkg),
        }
    }

    // Overrides may have moved a parent package past the parent's range.
    let mut next_order = merged
        .iter()
        .filter_map(|p| p.install_order)
        .max()
        .unwrap_or_else(|| u32::try_from(parent.len()).unwrap_or(u32::MAX));
    for mut pkg in appended {
        next_order = next_order.saturating_add(1);
        pkg.install_order = Some(next_order);
        merged.push(pkg);
    }
    merged
}

fn override_package(existing: &mut PackageRef, child: PackageRef) {
    existing.version = child.version;
    existing.required = child.required;
    if child.reason.is_some() {
        existing.reason = child.reason;
    }
    if child.install_order.is_some() {
        existing.install_order = child.install_order;
    }
    if child.format_override.is_some() {
        existing.format_override = child.format_override;
    }
    existing.format_specific.extend(child.format_specific);
    existing.extra.extend(child.extra);
}

fn merge_config(
    parent: Option<&CollectionConfig>,
    child: Option<CollectionConfig>,
) -> Option<CollectionConfig> {
    match (parent, child) {
        (None, child) => child,
        (Some(parent), None) => Some(parent.clone()),
        (Some(parent), Some(child)) => {
            let mut mcp_servers: BTreeMap<_, _> = parent.mcp_servers.clone();
            mcp_servers.extend(child.mcp_servers);
            Some(CollectionConfig {
                default_format: child.default_format.or(parent.default_format),
                install_order: child.install_order.or(parent.install_order),
                post_install: child.post_install.or_else(|| parent.post_install.clone()),
                mcp_servers,
            })
        }
    }
}
