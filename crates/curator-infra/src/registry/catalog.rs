//! Registry backed by a local catalog snapshot.
//!
//! The snapshot is a JSON export of the package registry:
//!
//! ```json
//! { "packages": [ { "id": "react-rules", "versions": ["1.0.0", "1.2.0"],
//!                   "formats": ["cursor", "claude"], "description": "..." } ] }
//! ```
//!
//! Lookups pick the highest published version satisfying the requested
//! range. `latest` is the highest stable version, or the highest
//! pre-release when nothing stable has been published.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use curator_core::repository::registry::RegistryLookup;
use curator_types::collection::{Format, LATEST_VERSION};
use curator_types::error::LookupError;
use curator_types::resolution::{ResolutionResult, ResolvedPackage};
use semver::{Version, VersionReq};
use serde::{Deserialize, Serialize};

/// Serialized snapshot file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    #[serde(default)]
    pub packages: Vec<CatalogEntry>,
}

/// One package as published in the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: String,
    #[serde(default)]
    pub versions: Vec<String>,
    #[serde(default)]
    pub formats: Vec<Format>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
struct IndexedPackage {
    /// Ascending.
    versions: Vec<Version>,
    formats: Vec<Format>,
    description: Option<String>,
}

/// In-memory registry built from a [`CatalogSnapshot`].
#[derive(Debug, Clone, Default)]
pub struct CatalogRegistry {
    packages: BTreeMap<String, IndexedPackage>,
}

impl CatalogRegistry {
    pub fn from_snapshot(snapshot: CatalogSnapshot) -> Self {
        let mut packages = BTreeMap::new();
        for entry in snapshot.packages {
            let mut versions: Vec<Version> = entry
                .versions
                .iter()
                .filter_map(|raw| match Version::parse(raw) {
                    Ok(v) => Some(v),
                    Err(e) => {
                        tracing::warn!(package = %entry.id, version = %raw, error = %e, "Ignoring unparsable catalog version");
                        None
                    }
                })
                .collect();
            versions.sort();
            versions.dedup();

            packages.insert(
                entry.id,
                IndexedPackage {
                    versions,
                    formats: entry.formats,
                    description: entry.description,
                },
            );
        }
        Self { packages }
    }

    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let snapshot: CatalogSnapshot =
            serde_json::from_str(json).context("Failed to parse catalog snapshot")?;
        Ok(Self::from_snapshot(snapshot))
    }

    /// Load a snapshot file from disk.
    pub async fn load(path: &Path) -> anyhow::Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read catalog {}", path.display()))?;
        let registry = Self::from_json(&content)
            .with_context(|| format!("Invalid catalog {}", path.display()))?;
        tracing::info!(
            path = %path.display(),
            packages = registry.len(),
            "Loaded package catalog"
        );
        Ok(registry)
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    fn resolve(&self, package_id: &str, version: &str) -> Result<ResolutionResult, LookupError> {
        let Some(package) = self.packages.get(package_id) else {
            return Ok(ResolutionResult::NotFound);
        };

        let matched = if version == LATEST_VERSION {
            package
                .versions
                .iter()
                .rev()
                .find(|v| v.pre.is_empty())
                .or_else(|| package.versions.last())
        } else {
            let req = VersionReq::parse(version).map_err(|e| {
                LookupError::InvalidResponse(format!("unusable version range '{version}': {e}"))
            })?;
            package.versions.iter().rev().find(|v| req.matches(v))
        };

        Ok(match matched {
            Some(found) => ResolutionResult::Found(ResolvedPackage {
                package_id: package_id.to_string(),
                version: found.to_string(),
                formats: package.formats.clone(),
                description: package.description.clone(),
            }),
            None => ResolutionResult::VersionMismatch {
                available: package.versions.iter().map(Version::to_string).collect(),
            },
        })
    }
}

impl RegistryLookup for CatalogRegistry {
    async fn lookup(&self, package_id: &str, version: &str) -> Result<ResolutionResult, LookupError> {
        let result = self.resolve(package_id, version);
        tracing::trace!(package_id, version, ?result, "catalog lookup");
        result
    }
}
