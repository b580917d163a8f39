//! Collection definition store trait.

use curator_types::collection::CollectionDefinition;
use curator_types::error::StoreError;
use serde_json::Value;

use crate::collection::{mcp, schema};

/// Read access to already-published collection definitions.
///
/// Only the inheritance composer uses this, to fetch `extends` parents.
pub trait DefinitionStore: Send + Sync {
    /// Fetch a definition by scope and id. `Ok(None)` when it does not exist.
    fn get(
        &self,
        scope: &str,
        id: &str,
    ) -> impl std::future::Future<Output = Result<Option<CollectionDefinition>, StoreError>> + Send;
}

/// Build a stored definition from its untyped document.
///
/// Stores that keep raw documents should load through here: normalization
/// coerces malformed MCP server entries, so the raw block is checked before
/// the typed value is handed out.
pub fn definition_from_document(
    reference: &str,
    raw: &Value,
) -> Result<CollectionDefinition, StoreError> {
    let definition = schema::normalize(raw).map_err(|source| StoreError::Invalid {
        reference: reference.to_string(),
        source,
    })?;

    let problems: Vec<String> = mcp::raw_servers(raw)
        .map(mcp::validate_raw_mcp_servers)
        .unwrap_or_default()
        .into_iter()
        .map(|finding| finding.message)
        .collect();
    if !problems.is_empty() {
        return Err(StoreError::McpConfig {
            reference: reference.to_string(),
            problems,
        });
    }
    Ok(definition)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document(servers: Value) -> Value {
        json!({
            "id": "base",
            "scope": "alice",
            "name": "Base",
            "description": "Shared database tooling for every backend collection.",
            "version": "1.0.0",
            "icon": "🗄️",
            "packages": [{ "packageId": "sql-rules" }],
            "config": { "mcpServers": servers }
        })
    }

    #[test]
    fn test_well_formed_document_loads() {
        let raw = document(json!({ "pg": { "command": "pg-mcp", "optional": true } }));
        let def = definition_from_document("@alice/base", &raw).unwrap();
        assert!(def.mcp_servers().unwrap()["pg"].optional);
    }

    #[test]
    fn test_malformed_mcp_block_is_rejected() {
        let raw = document(json!({
            "pg": { "command": "pg-mcp", "optional": "yes", "args": ["-x", 3], "env": { "T": 42 } }
        }));
        let err = definition_from_document("@alice/base", &raw).unwrap_err();
        match err {
            StoreError::McpConfig { reference, problems } => {
                assert_eq!(reference, "@alice/base");
                assert_eq!(problems.len(), 3);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_schema_violations_win_over_mcp_problems() {
        let mut raw = document(json!({ "pg": { "optional": "yes" } }));
        raw["id"] = json!("Not A Slug");
        let err = definition_from_document("@alice/base", &raw).unwrap_err();
        assert!(matches!(err, StoreError::Invalid { .. }));
    }
}
