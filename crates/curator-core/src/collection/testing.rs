//! Fixtures and in-memory collaborators shared by the collection tests.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use curator_types::collection::{Category, CollectionDefinition, PackageRef};
use curator_types::error::{LookupError, StoreError};
use curator_types::resolution::{ResolutionResult, ResolvedPackage};
use serde_json::Value;

use crate::repository::registry::RegistryLookup;
use crate::repository::store::{definition_from_document, DefinitionStore};

/// A package with a reason and a pinned range.
pub fn package(id: &str, install_order: Option<u32>) -> PackageRef {
    let mut pkg = PackageRef::new(id, "^1.0.0");
    pkg.reason = Some(format!("Provides {id} conventions"));
    pkg.install_order = install_order;
    pkg
}

pub fn optional_package(id: &str, install_order: Option<u32>) -> PackageRef {
    let mut pkg = package(id, install_order);
    pkg.required = false;
    pkg
}

/// A definition that satisfies every quality rule except those driven by
/// `packages`.
pub fn definition(id: &str, packages: Vec<PackageRef>) -> CollectionDefinition {
    CollectionDefinition {
        id: id.to_string(),
        scope: "alice".to_string(),
        name: format!("{id} collection"),
        description: "A complete, curated workflow for building and testing web applications."
            .to_string(),
        version: semver::Version::new(1, 0, 0),
        category: Some(Category::Development),
        tags: ["react", "typescript", "testing", "nextjs", "tailwind"]
            .iter()
            .map(|t| t.to_string())
            .collect(),
        framework: None,
        icon: "⚛️".to_string(),
        official: false,
        verified: false,
        packages,
        config: None,
        extends: None,
        extra: BTreeMap::new(),
    }
}

// ---------------------------------------------------------------------------
// In-memory definition store
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryStore {
    defs: HashMap<(String, String), CollectionDefinition>,
    /// Raw documents, loaded on every read like a file-backed store.
    docs: HashMap<(String, String), Value>,
    fail: bool,
}

impl MemoryStore {
    /// A store whose every read fails.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn with(mut self, def: CollectionDefinition) -> Self {
        self.defs.insert((def.scope.clone(), def.id.clone()), def);
        self
    }

    pub fn with_document(mut self, doc: Value) -> Self {
        let field = |name: &str| doc[name].as_str().unwrap_or_default().to_string();
        let key = (field("scope"), field("id"));
        self.docs.insert(key, doc);
        self
    }
}

impl DefinitionStore for MemoryStore {
    async fn get(&self, scope: &str, id: &str) -> Result<Option<CollectionDefinition>, StoreError> {
        if self.fail {
            return Err(StoreError::Storage("disk unavailable".to_string()));
        }
        let key = (scope.to_string(), id.to_string());
        if let Some(doc) = self.docs.get(&key) {
            return definition_from_document(&format!("@{scope}/{id}"), doc).map(Some);
        }
        Ok(self.defs.get(&key).cloned())
    }
}

// ---------------------------------------------------------------------------
// Fake registry
// ---------------------------------------------------------------------------

/// Registry that knows a fixed set of package ids.
///
/// Tracks how many lookups run at once so tests can assert the
/// concurrency bound.
#[derive(Default)]
pub struct FakeRegistry {
    known: HashSet<String>,
    mismatched: HashSet<String>,
    failing: HashSet<String>,
    delays: HashMap<String, Duration>,
    default_delay: Option<Duration>,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    pub calls: AtomicUsize,
}

impl FakeRegistry {
    pub fn knowing<'a>(ids: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            known: ids.into_iter().map(str::to_string).collect(),
            ..Default::default()
        }
    }

    pub fn mismatching(mut self, id: &str) -> Self {
        self.mismatched.insert(id.to_string());
        self
    }

    pub fn failing(mut self, id: &str) -> Self {
        self.failing.insert(id.to_string());
        self
    }

    pub fn delaying(mut self, id: &str, delay: Duration) -> Self {
        self.delays.insert(id.to_string(), delay);
        self
    }

    pub fn with_default_delay(mut self, delay: Duration) -> Self {
        self.default_delay = Some(delay);
        self
    }
}

impl RegistryLookup for FakeRegistry {
    async fn lookup(&self, package_id: &str, _version: &str) -> Result<ResolutionResult, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let delay = self.delays.get(package_id).copied().or(self.default_delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.contains(package_id) {
            return Err(LookupError::Unavailable("connection reset".to_string()));
        }
        if self.mismatched.contains(package_id) {
            return Ok(ResolutionResult::VersionMismatch {
                available: vec!["0.9.0".to_string()],
            });
        }
        if self.known.contains(package_id) {
            return Ok(ResolutionResult::Found(ResolvedPackage {
                package_id: package_id.to_string(),
                version: "1.4.2".to_string(),
                formats: Vec::new(),
                description: None,
            }));
        }
        Ok(ResolutionResult::NotFound)
    }
}
