//! Filesystem-based collection definition storage.
//!
//! Published definitions live under `~/.curator/collections/`, one file per
//! collection, grouped by scope. JSON, YAML and TOML files are all read;
//! writes always produce canonical JSON.

use std::path::{Path, PathBuf};

use anyhow::Context;
use curator_core::collection::schema::{check_slug, parse_value, serialize_collection, DefinitionFormat};
use curator_core::repository::store::{definition_from_document, DefinitionStore};
use curator_types::collection::CollectionDefinition;
use curator_types::error::{SchemaError, SchemaViolation, StoreError, ViolationKind};

/// Extensions probed for a definition, in priority order.
const EXTENSIONS: &[&str] = &["json", "yaml", "yml", "toml"];

/// Filesystem definition store rooted at a configurable base directory.
///
/// Layout:
/// ```text
/// {base_dir}/collections/{scope}/{id}.json
/// {base_dir}/collections/{scope}/{id}.yaml
/// ```
#[derive(Debug, Clone)]
pub struct FsDefinitionStore {
    base_dir: PathBuf,
}

impl FsDefinitionStore {
    /// The collections directory will be `{base_dir}/collections/`.
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    fn collections_dir(&self) -> PathBuf {
        self.base_dir.join("collections")
    }

    fn scope_dir(&self, scope: &str) -> PathBuf {
        self.collections_dir().join(scope)
    }

    /// Find the file holding `@scope/id`, if any.
    async fn locate(&self, scope: &str, id: &str) -> Result<Option<PathBuf>, StoreError> {
        // Slugs only; anything else could escape the store directory.
        for part in [scope, id] {
            check_slug(part).map_err(|msg| {
                StoreError::Storage(format!("invalid collection reference @{scope}/{id}: {msg}"))
            })?;
        }

        let dir = self.scope_dir(scope);
        for ext in EXTENSIONS {
            let path = dir.join(format!("{id}.{ext}"));
            match tokio::fs::try_exists(&path).await {
                Ok(true) => return Ok(Some(path)),
                Ok(false) => {}
                Err(e) => {
                    return Err(StoreError::Storage(format!(
                        "failed to probe {}: {e}",
                        path.display()
                    )));
                }
            }
        }
        Ok(None)
    }

    /// List every readable definition in `scope`, ordered by id.
    ///
    /// Files that fail to parse are skipped with a warning.
    pub async fn list(&self, scope: &str) -> anyhow::Result<Vec<CollectionDefinition>> {
        let dir = self.scope_dir(scope);
        if !tokio::fs::try_exists(&dir).await.unwrap_or(false) {
            return Ok(Vec::new());
        }

        let mut entries = tokio::fs::read_dir(&dir)
            .await
            .with_context(|| format!("Failed to read collections directory: {}", dir.display()))?;

        let mut defs = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let Some(format) = DefinitionFormat::from_path(&path) else {
                continue;
            };
            let reference = path.display().to_string();
            match read_definition(&path, format, &reference).await {
                Ok(def) => defs.push(def),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable collection");
                }
            }
        }

        defs.sort_by(|a, b| a.id.cmp(&b.id));
        defs.dedup_by(|a, b| a.id == b.id);
        Ok(defs)
    }

    /// Write `def` as canonical JSON and return the file path.
    pub async fn save(&self, def: &CollectionDefinition) -> anyhow::Result<PathBuf> {
        check_slug(&def.scope)
            .map_err(|msg| anyhow::anyhow!("Invalid scope for {}: {msg}", def.qualified_id()))?;
        check_slug(&def.id)
            .map_err(|msg| anyhow::anyhow!("Invalid id for {}: {msg}", def.qualified_id()))?;

        let dir = self.scope_dir(&def.scope);
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create {}", dir.display()))?;

        let path = dir.join(format!("{}.json", def.id));
        let json = serialize_collection(def)
            .with_context(|| format!("Failed to serialize {}", def.qualified_id()))?;
        tokio::fs::write(&path, json)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;

        tracing::info!(collection = %def.qualified_id(), path = %path.display(), "Saved collection");
        Ok(path)
    }
}

impl DefinitionStore for FsDefinitionStore {
    async fn get(&self, scope: &str, id: &str) -> Result<Option<CollectionDefinition>, StoreError> {
        let Some(path) = self.locate(scope, id).await? else {
            return Ok(None);
        };
        let reference = format!("@{scope}/{id}");

        let format = DefinitionFormat::from_path(&path).unwrap_or(DefinitionFormat::Json);
        let def = read_definition(&path, format, &reference).await?;

        if def.scope != scope || def.id != id {
            return Err(StoreError::Invalid {
                reference,
                source: SchemaError::single(SchemaViolation::new(
                    "id",
                    ViolationKind::InvalidValue(format!(
                        "file {} declares {}",
                        path.display(),
                        def.qualified_id()
                    )),
                )),
            });
        }
        Ok(Some(def))
    }
}

async fn read_definition(
    path: &Path,
    format: DefinitionFormat,
    reference: &str,
) -> Result<CollectionDefinition, StoreError> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| StoreError::Storage(format!("failed to read {}: {e}", path.display())))?;
    let raw = parse_value(&text, format).map_err(|source| StoreError::Invalid {
        reference: reference.to_string(),
        source,
    })?;
    definition_from_document(reference, &raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use curator_types::collection::PackageRef;
    use tempfile::TempDir;

    fn sample(scope: &str, id: &str) -> CollectionDefinition {
        let json = serde_json::json!({
            "id": id,
            "scope": scope,
            "name": "Sample",
            "description": "A sample collection used by the filesystem store tests.",
            "version": "1.2.0",
            "category": "testing",
            "tags": ["a", "b", "c"],
            "icon": "🧪",
            "packages": [{ "packageId": "jest-rules", "version": "^29.0.0" }],
            "x-owner": "qa-team"
        });
        curator_core::collection::schema::normalize(&json).unwrap()
    }

    #[tokio::test]
    async fn test_save_then_get() {
        let tmp = TempDir::new().unwrap();
        let store = FsDefinitionStore::new(tmp.path().to_path_buf());
        let def = sample("alice", "qa-kit");

        let path = store.save(&def).await.unwrap();
        assert!(path.ends_with("collections/alice/qa-kit.json"));

        let loaded = store.get("alice", "qa-kit").await.unwrap().unwrap();
        assert_eq!(loaded, def);
        assert_eq!(loaded.extra["x-owner"], "qa-team");
    }

    #[tokio::test]
    async fn test_missing_definition_is_none() {
        let tmp = TempDir::new().unwrap();
        let store = FsDefinitionStore::new(tmp.path().to_path_buf());
        assert!(store.get("alice", "nothing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_reads_yaml_definitions() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("collections").join("bob");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("infra.yaml"),
            r#"
id: infra
scope: bob
name: Infra
description: Terraform and Kubernetes conventions for platform teams.
version: 2.0.0
category: devops
icon: "☁️"
packages:
  - packageId: terraform-rules
"#,
        )
        .unwrap();

        let store = FsDefinitionStore::new(tmp.path().to_path_buf());
        let def = store.get("bob", "infra").await.unwrap().unwrap();
        assert_eq!(def.packages, vec![PackageRef::new("terraform-rules", "latest")]);
    }

    #[tokio::test]
    async fn test_invalid_file_is_reported() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("collections").join("alice");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("broken.json"), r#"{ "id": "broken" }"#).unwrap();

        let store = FsDefinitionStore::new(tmp.path().to_path_buf());
        let err = store.get("alice", "broken").await.unwrap_err();
        assert!(matches!(err, StoreError::Invalid { ref reference, .. } if reference == "@alice/broken"));
    }

    #[tokio::test]
    async fn test_malformed_mcp_block_is_reported() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("collections").join("alice");
        std::fs::create_dir_all(&dir).unwrap();
        let mut doc = serde_json::to_value(sample("alice", "base")).unwrap();
        doc["config"] = serde_json::json!({
            "mcpServers": { "pg": { "command": "pg-mcp", "optional": "yes" } }
        });
        std::fs::write(dir.join("base.json"), doc.to_string()).unwrap();

        let store = FsDefinitionStore::new(tmp.path().to_path_buf());
        let err = store.get("alice", "base").await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::McpConfig { ref problems, .. } if problems.len() == 1
        ));
        assert!(store.list("alice").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_mismatched_identity_is_invalid() {
        let tmp = TempDir::new().unwrap();
        let store = FsDefinitionStore::new(tmp.path().to_path_buf());
        let path = store.save(&sample("alice", "real")).await.unwrap();
        std::fs::copy(&path, path.with_file_name("alias.json")).unwrap();

        let err = store.get("alice", "alias").await.unwrap_err();
        assert!(matches!(err, StoreError::Invalid { .. }));
    }

    #[tokio::test]
    async fn test_rejects_path_traversal() {
        let tmp = TempDir::new().unwrap();
        let store = FsDefinitionStore::new(tmp.path().to_path_buf());
        let err = store.get("..", "etc").await.unwrap_err();
        assert!(matches!(err, StoreError::Storage(_)));
    }

    #[tokio::test]
    async fn test_list_skips_corrupted_files() {
        let tmp = TempDir::new().unwrap();
        let store = FsDefinitionStore::new(tmp.path().to_path_buf());
        store.save(&sample("alice", "zeta")).await.unwrap();
        store.save(&sample("alice", "alpha")).await.unwrap();
        std::fs::write(
            tmp.path().join("collections/alice/garbage.json"),
            "not json",
        )
        .unwrap();
        std::fs::write(tmp.path().join("collections/alice/README.md"), "# notes").unwrap();

        let defs = store.list("alice").await.unwrap();
        let ids: Vec<_> = defs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, ["alpha", "zeta"]);
        assert!(store.list("nobody").await.unwrap().is_empty());
    }
}
