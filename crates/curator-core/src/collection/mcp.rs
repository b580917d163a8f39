//! MCP server block validation.
//!
//! Checks the shape of `config.mcpServers` entries. Commands are never
//! executed or probed; whether they are reachable is a runtime concern of
//! the consuming editor.

use std::collections::BTreeMap;

use curator_types::collection::McpServerConfig;
use curator_types::report::{Finding, FindingCode};
use serde_json::{Map, Value};

/// Validate the raw `mcpServers` object from an untyped document.
///
/// This is the authoritative check: it sees values (a string `optional`,
/// a numeric arg) that the typed model cannot represent.
pub fn validate_raw_mcp_servers(servers: &Value) -> Vec<Finding> {
    let Some(servers) = servers.as_object() else {
        return vec![mcp_error("config.mcpServers must be an object")];
    };

    let mut findings = Vec::new();
    for (name, server) in servers {
        let Some(server) = server.as_object() else {
            findings.push(mcp_error(format!("server '{name}' must be an object")));
            continue;
        };

        match server.get("command") {
            Some(Value::String(cmd)) if !cmd.trim().is_empty() => {}
            Some(Value::String(_)) => {
                findings.push(mcp_error(format!("server '{name}' has an empty command")));
            }
            Some(_) => {
                findings.push(mcp_error(format!("server '{name}' command must be a string")));
            }
            None => {
                findings.push(mcp_error(format!("server '{name}' is missing a command")));
            }
        }

        match server.get("args") {
            None | Some(Value::Null) => {}
            Some(Value::Array(args)) if args.iter().all(Value::is_string) => {}
            Some(_) => findings.push(mcp_error(format!(
                "server '{name}' args must be a list of strings"
            ))),
        }

        match server.get("env") {
            None | Some(Value::Null) => {}
            Some(Value::Object(env)) if env.values().all(Value::is_string) => {}
            Some(_) => findings.push(mcp_error(format!(
                "server '{name}' env must map variable names to strings"
            ))),
        }

        match server.get("optional") {
            None | Some(Value::Null) | Some(Value::Bool(_)) => {}
            Some(_) => findings.push(mcp_error(format!(
                "server '{name}' optional flag must be a boolean"
            ))),
        }
    }
    findings
}

/// Validate typed server configs, e.g. after inheritance composition.
pub fn validate_mcp_servers(servers: &BTreeMap<String, McpServerConfig>) -> Vec<Finding> {
    servers
        .iter()
        .filter(|(_, server)| server.command.trim().is_empty())
        .map(|(name, _)| mcp_error(format!("server '{name}' has an empty command")))
        .collect()
}

/// Find the raw `config.mcpServers` value in a document, if any.
pub fn raw_servers(doc: &Value) -> Option<&Value> {
    doc.get("config")?
        .get("mcpServers")
        .filter(|v| !v.is_null())
}

/// Best-effort conversion used by the normalizer; malformed pieces fall
/// back to defaults and are reported by [`validate_raw_mcp_servers`].
pub(crate) fn coerce_servers(servers: &Map<String, Value>) -> BTreeMap<String, McpServerConfig> {
    servers
        .iter()
        .map(|(name, server)| (name.clone(), coerce_server(server)))
        .collect()
}

fn coerce_server(server: &Value) -> McpServerConfig {
    let str_field = |key: &str| server.get(key).and_then(Value::as_str).map(str::to_string);

    McpServerConfig {
        command: str_field("command").unwrap_or_default(),
        args: server
            .get("args")
            .and_then(Value::as_array)
            .map(|args| {
                args.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default(),
        env: server
            .get("env")
            .and_then(Value::as_object)
            .map(|env| {
                env.iter()
                    .filter_map(|(k, v)| v.as_str().map(|v| (k.clone(), v.to_string())))
                    .collect()
            })
            .unwrap_or_default(),
        description: str_field("description"),
        optional: server
            .get("optional")
            .and_then(Value::as_bool)
            .unwrap_or(false),
    }
}

fn mcp_error(message: impl Into<String>) -> Finding {
    Finding::error(FindingCode::McpConfigError, message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use curator_types::report::Severity;
    use serde_json::json;

    #[test]
    fn test_well_formed_servers_pass() {
        let servers = json!({
            "filesystem": {
                "command": "npx",
                "args": ["-y", "@modelcontextprotocol/server-filesystem"],
                "env": { "ROOT": "/workspace" },
                "description": "Local file access",
                "optional": false
            },
            "git": { "command": "uvx", "args": ["mcp-server-git"] }
        });
        assert!(validate_raw_mcp_servers(&servers).is_empty());
    }

    #[test]
    fn test_empty_command_is_an_error() {
        let servers = json!({ "db": { "command": "" } });
        let findings = validate_raw_mcp_servers(&servers);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].code, FindingCode::McpConfigError);
        assert_eq!(findings[0].severity, Severity::Error);
        assert!(findings[0].message.contains("empty command"));
    }

    #[test]
    fn test_non_boolean_optional_is_an_error() {
        let servers = json!({ "db": { "command": "pg-mcp", "optional": "yes" } });
        let findings = validate_raw_mcp_servers(&servers);
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.contains("optional flag must be a boolean"));
    }

    #[test]
    fn test_reports_every_malformed_field() {
        let servers = json!({
            "a": { "args": ["ok", 3], "env": { "TOKEN": 42 } },
            "b": "not an object"
        });
        let findings = validate_raw_mcp_servers(&servers);
        // a: missing command, bad args, bad env; b: not an object
        assert_eq!(findings.len(), 4);
        assert!(findings.iter().all(|f| f.code == FindingCode::McpConfigError));
    }

    #[test]
    fn test_typed_validation_flags_blank_command() {
        let mut servers = BTreeMap::new();
        servers.insert(
            "ok".to_string(),
            McpServerConfig {
                command: "npx".into(),
                ..Default::default()
            },
        );
        servers.insert(
            "blank".to_string(),
            McpServerConfig {
                command: "   ".into(),
                ..Default::default()
            },
        );
        let findings = validate_mcp_servers(&servers);
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.contains("'blank'"));
    }

    #[test]
    fn test_coercion_keeps_valid_parts() {
        let raw = json!({ "command": "npx", "args": ["-y", 1], "optional": "yes" });
        let server = coerce_server(&raw);
        assert_eq!(server.command, "npx");
        assert_eq!(server.args, vec!["-y".to_string()]);
        assert!(!server.optional);
    }

    #[test]
    fn test_raw_servers_lookup() {
        let doc = json!({ "config": { "mcpServers": { "x": { "command": "y" } } } });
        assert!(raw_servers(&doc).is_some());
        assert!(raw_servers(&json!({ "config": {} })).is_none());
    }
}
