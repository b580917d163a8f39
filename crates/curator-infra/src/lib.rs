//! Infrastructure layer for the collection curator.
//!
//! Implementations of the ports defined in `curator-core`: a filesystem
//! definition store, a catalog-snapshot registry, and the `curator.toml`
//! configuration loader.

use std::path::PathBuf;

pub mod config;
pub mod registry;
pub mod store;

/// Resolve the curator data directory.
///
/// Priority:
/// 1. `CURATOR_DATA_DIR` environment variable
/// 2. `~/.curator`
pub fn default_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("CURATOR_DATA_DIR") {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".curator");
    }

    // Last resort: current directory
    PathBuf::from(".curator")
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use curator_core::collection::pipeline::CollectionValidator;
    use curator_core::collection::schema::{parse_collection, DefinitionFormat};
    use curator_types::report::{FindingCode, Outcome, Severity};
    use tempfile::TempDir;
    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::registry::CatalogRegistry;
    use crate::store::FsDefinitionStore;

    const CATALOG: &str = r#"{
        "packages": [
            { "id": "react-core", "versions": ["18.2.0"] },
            { "id": "typescript-strict", "versions": ["5.4.0"] },
            { "id": "eslint-react", "versions": ["1.3.0", "2.1.0"] },
            { "id": "prettier", "versions": ["3.2.5"] },
            { "id": "playwright", "versions": ["1.44.0"] }
        ]
    }"#;

    const PARENT: &str = r#"{
        "id": "react-base",
        "scope": "alice",
        "name": "React Base",
        "description": "Shared React conventions used by every frontend collection.",
        "version": "1.0.0",
        "category": "development",
        "tags": ["react", "typescript", "frontend"],
        "icon": "⚛️",
        "packages": [
            { "packageId": "react-core", "version": "^18.0.0", "reason": "Component patterns", "installOrder": 1 },
            { "packageId": "typescript-strict", "version": "^5.0.0", "reason": "Strict typing", "installOrder": 2 },
            { "packageId": "eslint-react", "version": "^1.0.0", "required": false, "reason": "Lint rules", "installOrder": 3 }
        ]
    }"#;

    const CHILD: &str = r#"
id = "react-e2e"
scope = "alice"
name = "React E2E"
description = "React conventions plus browser end-to-end testing with Playwright."
version = "1.1.0"
icon = "🎭"
extends = "react-base"

[[packages]]
packageId = "eslint-react"
version = "^2.0.0"
required = false

[[packages]]
packageId = "playwright"
version = "^1.40.0"
required = false
reason = "Browser automation"
"#;

    #[tokio::test]
    async fn test_validates_against_filesystem_store_and_catalog() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(
            tmp.path().join(config::CONFIG_FILE),
            "[resolution]\nmax_concurrency = 2\n",
        )
        .await
        .unwrap();

        let store = FsDefinitionStore::new(tmp.path().to_path_buf());
        let parent = parse_collection(PARENT, DefinitionFormat::Json).unwrap();
        store.save(&parent).await.unwrap();

        let config = config::load_validator_config(tmp.path()).await;
        let registry = CatalogRegistry::from_json(CATALOG).unwrap();
        let validator = CollectionValidator::new(Arc::new(registry), Arc::new(store), config);

        let report = validator
            .validate_text(CHILD, DefinitionFormat::Toml, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.outcome, Outcome::Accepted, "{:?}", report.findings);
        assert_eq!(report.count(Severity::Error), 0);
        let composed = report.definition.unwrap();
        assert_eq!(composed.packages.len(), 4);
        assert_eq!(composed.tags.len(), 3);
        let eslint = composed.package("eslint-react").unwrap();
        assert_eq!(eslint.version, "^2.0.0");
        assert_eq!(eslint.reason.as_deref(), Some("Lint rules"));
        assert_eq!(composed.package("playwright").unwrap().install_order, Some(4));
    }

    #[tokio::test]
    async fn test_parent_with_malformed_mcp_block_rejects_child() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("collections").join("alice");
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let mut parent: serde_json::Value = serde_json::from_str(PARENT).unwrap();
        parent["config"] = serde_json::json!({
            "mcpServers": {
                "pg": { "command": "pg-mcp", "optional": "yes", "args": ["-x", 3], "env": { "T": 42 } }
            }
        });
        tokio::fs::write(dir.join("react-base.json"), parent.to_string())
            .await
            .unwrap();

        let registry = CatalogRegistry::from_json(CATALOG).unwrap();
        let validator = CollectionValidator::new(
            Arc::new(registry),
            Arc::new(FsDefinitionStore::new(tmp.path().to_path_buf())),
            config::load_validator_config(tmp.path()).await,
        );

        let report = validator
            .validate_text(CHILD, DefinitionFormat::Toml, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(report.outcome, Outcome::Rejected);
        assert_eq!(report.count(Severity::Error), 3);
        assert!(report.findings.iter().all(|f| f.code == FindingCode::McpConfigError));
        assert!(report.definition.is_none());
    }

    #[tokio::test]
    async fn test_catalog_version_mismatch_rejects_required_package() {
        let tmp = TempDir::new().unwrap();
        let store = FsDefinitionStore::new(tmp.path().to_path_buf());
        let registry = CatalogRegistry::from_json(CATALOG).unwrap();
        let validator = CollectionValidator::new(
            Arc::new(registry),
            Arc::new(store),
            config::load_validator_config(tmp.path()).await,
        );

        let mut parent = parse_collection(PARENT, DefinitionFormat::Json).unwrap();
        parent.packages[0].version = "^19.0.0".into();

        let report = validator
            .validate(&parent, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(report.outcome, Outcome::Rejected);
        assert!(report.has_code(FindingCode::ResolutionFailure));
        assert!(report.findings[0].message.contains("version_mismatch"));
    }

    #[test]
    fn test_data_dir_ends_with_curator() {
        if std::env::var("CURATOR_DATA_DIR").is_err() {
            assert!(default_data_dir().ends_with(".curator"));
        }
    }
}
