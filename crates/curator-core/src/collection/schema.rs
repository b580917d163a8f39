//! Collection definition parsing and structural normalization.
//!
//! Converts an untyped document tree (JSON, YAML or TOML) into the canonical
//! `CollectionDefinition`. Normalization never stops at the first problem:
//! every violation is collected so tooling can report them together.
//! Unknown fields are carried through untouched.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use curator_types::collection::{
    Category, CollectionConfig, CollectionDefinition, CollectionRef, Format, InstallOrderMode,
    PackageRef, LATEST_VERSION,
};
use curator_types::error::{SchemaError, SchemaViolation, ViolationKind};
use serde_json::{Map, Value};

use super::mcp;

const TOP_LEVEL_FIELDS: &[&str] = &[
    "id",
    "scope",
    "name",
    "description",
    "version",
    "category",
    "tags",
    "framework",
    "icon",
    "official",
    "verified",
    "packages",
    "config",
    "extends",
];

const PACKAGE_FIELDS: &[&str] = &[
    "packageId",
    "version",
    "required",
    "reason",
    "installOrder",
    "formatOverride",
    "formatSpecific",
];

const INSTALL_ORDER_MODES: &[&str] = &["sequential", "parallel"];

// ---------------------------------------------------------------------------
// Document formats
// ---------------------------------------------------------------------------

/// Serialization formats a definition may be authored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefinitionFormat {
    Json,
    Yaml,
    Toml,
}

impl DefinitionFormat {
    /// Pick the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            "toml" => Some(Self::Toml),
            _ => None,
        }
    }
}

impl fmt::Display for DefinitionFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => write!(f, "JSON"),
            Self::Yaml => write!(f, "YAML"),
            Self::Toml => write!(f, "TOML"),
        }
    }
}

/// Parse text into an untyped document tree.
///
/// A syntax error becomes a single root-level violation.
pub fn parse_value(text: &str, format: DefinitionFormat) -> Result<Value, SchemaError> {
    let parsed = match format {
        DefinitionFormat::Json => serde_json::from_str::<Value>(text).map_err(|e| e.to_string()),
        DefinitionFormat::Yaml => serde_yaml_ng::from_str::<Value>(text).map_err(|e| e.to_string()),
        DefinitionFormat::Toml => toml::from_str::<Value>(text).map_err(|e| e.to_string()),
    };

    parsed.map_err(|msg| {
        SchemaError::single(SchemaViolation::new(
            "",
            ViolationKind::InvalidValue(format!("failed to parse {format} document: {msg}")),
        ))
    })
}

/// Parse and normalize a definition in one step.
pub fn parse_collection(
    text: &str,
    format: DefinitionFormat,
) -> Result<CollectionDefinition, SchemaError> {
    let value = parse_value(text, format)?;
    normalize(&value)
}

/// Serialize a definition to canonical pretty-printed JSON.
///
/// All maps in the definition are ordered, so equal definitions always
/// produce identical bytes.
pub fn serialize_collection(def: &CollectionDefinition) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(def)
}

/// Check that `s` is a slug: lowercase ASCII letters, digits and hyphens,
/// not starting or ending with a hyphen.
pub fn check_slug(s: &str) -> Result<(), String> {
    if s.is_empty() {
        return Err("must not be empty".to_string());
    }
    if !s
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(format!(
            "'{s}' must contain only lowercase letters, digits, and hyphens"
        ));
    }
    if s.starts_with('-') || s.ends_with('-') {
        return Err(format!("'{s}' must not start or end with a hyphen"));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Normalize an untyped tree into a `CollectionDefinition`.
pub fn normalize(raw: &Value) -> Result<CollectionDefinition, SchemaError> {
    let Some(obj) = raw.as_object() else {
        return Err(SchemaError::single(SchemaViolation::new(
            "",
            ViolationKind::WrongType {
                expected: "object",
                found: type_name(raw),
            },
        )));
    };

    let mut n = Normalizer::default();

    let id = n.string(obj, "id", "");
    if let Some(id) = &id {
        if let Err(msg) = check_slug(id) {
            n.push("id", ViolationKind::InvalidValue(format!("collection id {msg}")));
        }
    }

    let scope = n.non_empty_string(obj, "scope", "");
    let name = n.non_empty_string(obj, "name", "");
    let description = n.non_empty_string(obj, "description", "");
    let icon = n.non_empty_string(obj, "icon", "");

    let version = n.string(obj, "version", "").and_then(|v| {
        match semver::Version::parse(&v) {
            Ok(version) => Some(version),
            Err(e) => {
                n.push(
                    "version",
                    ViolationKind::InvalidValue(format!("'{v}' is not a semantic version: {e}")),
                );
                None
            }
        }
    });

    let category =
        n.opt_enum::<Category>(obj, "category", "", &Category::ALL.map(|c| c.as_str()));
    let tags = n.string_list(obj, "tags", "");
    let framework = n.opt_string(obj, "framework", "");
    let official = n.opt_bool(obj, "official", "").unwrap_or(false);
    let verified = n.opt_bool(obj, "verified", "").unwrap_or(false);

    let packages = match n.required(obj, "packages", "") {
        Some(Value::Array(items)) => n.packages(items),
        Some(other) => {
            n.wrong_type("packages", "array", other);
            Vec::new()
        }
        None => Vec::new(),
    };

    let config = match present(obj, "config") {
        Some(value) => n.config(value, "config"),
        None => None,
    };

    let extends = n.opt_string(obj, "extends", "");
    if let Some(raw_ref) = &extends {
        let own_scope = scope.as_deref().unwrap_or_default();
        if let Err(msg) = CollectionRef::parse(raw_ref, own_scope) {
            n.push("extends", ViolationKind::InvalidValue(msg));
        }
    }

    let extra = extra_fields(obj, TOP_LEVEL_FIELDS);

    match (id, scope, name, description, version, icon) {
        (Some(id), Some(scope), Some(name), Some(description), Some(version), Some(icon))
            if n.violations.is_empty() =>
        {
            Ok(CollectionDefinition {
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
                packages,
                config,
                extends,
                extra,
            })
        }
        _ => Err(n.into_error()),
    }
}

/// Collects violations while walking a document.
#[derive(Default)]
struct Normalizer {
    violations: Vec<SchemaViolation>,
}

impl Normalizer {
    fn into_error(self) -> SchemaError {
        SchemaError {
            violations: self.violations,
        }
    }

    fn push(&mut self, path: impl Into<String>, kind: ViolationKind) {
        self.violations.push(SchemaViolation::new(path, kind));
    }

    fn wrong_type(&mut self, path: impl Into<String>, expected: &'static str, found: &Value) {
        self.push(
            path,
            ViolationKind::WrongType {
                expected,
                found: type_name(found),
            },
        );
    }

    /// Fetch a field that must be present and non-null.
    fn required<'a>(
        &mut self,
        obj: &'a Map<String, Value>,
        key: &str,
        parent: &str,
    ) -> Option<&'a Value> {
        let value = present(obj, key);
        if value.is_none() {
            self.push(join(parent, key), ViolationKind::MissingField);
        }
        value
    }

    fn string(&mut self, obj: &Map<String, Value>, key: &str, parent: &str) -> Option<String> {
        match self.required(obj, key, parent)? {
            Value::String(s) => Some(s.clone()),
            other => {
                self.wrong_type(join(parent, key), "string", other);
                None
            }
        }
    }

    fn non_empty_string(
        &mut self,
        obj: &Map<String, Value>,
        key: &str,
        parent: &str,
    ) -> Option<String> {
        let s = self.string(obj, key, parent)?;
        if s.trim().is_empty() {
            self.push(
                join(parent, key),
                ViolationKind::InvalidValue(format!("{key} must not be empty")),
            );
            return None;
        }
        Some(s)
    }

    fn opt_string(&mut self, obj: &Map<String, Value>, key: &str, parent: &str) -> Option<String> {
        match present(obj, key)? {
            Value::String(s) => Some(s.clone()),
            other => {
                self.wrong_type(join(parent, key), "string", other);
                None
            }
        }
    }

    fn opt_bool(&mut self, obj: &Map<String, Value>, key: &str, parent: &str) -> Option<bool> {
        match present(obj, key)? {
            Value::Bool(b) => Some(*b),
            other => {
                self.wrong_type(join(parent, key), "boolean", other);
                None
            }
        }
    }

    fn opt_enum<T: FromStr>(
        &mut self,
        obj: &Map<String, Value>,
        key: &str,
        parent: &str,
        allowed: &[&'static str],
    ) -> Option<T> {
        let raw = self.opt_string(obj, key, parent)?;
        match raw.parse::<T>() {
            Ok(value) => Some(value),
            Err(_) => {
                self.push(
                    join(parent, key),
                    ViolationKind::UnknownVariant {
                        value: raw,
                        allowed: allowed.to_vec(),
                    },
                );
                None
            }
        }
    }

    fn string_list(&mut self, obj: &Map<String, Value>, key: &str, parent: &str) -> Vec<String> {
        let path = join(parent, key);
        match present(obj, key) {
            None => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .enumerate()
                .filter_map(|(i, item)| match item {
                    Value::String(s) => Some(s.clone()),
                    other => {
                        self.wrong_type(format!("{path}[{i}]"), "string", other);
                        None
                    }
                })
                .collect(),
            Some(other) => {
                self.wrong_type(path, "array of strings", other);
                Vec::new()
            }
        }
    }

    fn opt_install_order(
        &mut self,
        obj: &Map<String, Value>,
        key: &str,
        parent: &str,
    ) -> Option<u32> {
        let path = join(parent, key);
        match present(obj, key)? {
            Value::Number(num) => match num.as_u64().and_then(|n| u32::try_from(n).ok()) {
                Some(order) if order > 0 => Some(order),
                _ => {
                    self.push(
                        path,
                        ViolationKind::InvalidValue(format!(
                            "{key} must be a positive integer, got {num}"
                        )),
                    );
                    None
                }
            },
            other => {
                self.wrong_type(path, "integer", other);
                None
            }
        }
    }

    fn packages(&mut self, items: &[Value]) -> Vec<PackageRef> {
        let mut seen = HashSet::new();
        let mut packages = Vec::with_capacity(items.len());

        for (i, item) in items.iter().enumerate() {
            let path = format!("packages[{i}]");
            let Some(obj) = item.as_object() else {
                self.wrong_type(path, "object", item);
                continue;
            };

            let package_id = self.non_empty_string(obj, "packageId", &path);

            let version = self
                .opt_string(obj, "version", &path)
                .unwrap_or_else(|| LATEST_VERSION.to_string());
            if version != LATEST_VERSION {
                if let Err(e) = semver::VersionReq::parse(&version) {
                    self.push(
                        join(&path, "version"),
                        ViolationKind::InvalidValue(format!(
                            "'{version}' is neither a semver range nor '{LATEST_VERSION}': {e}"
                        )),
                    );
                }
            }

            let required = self.opt_bool(obj, "required", &path).unwrap_or(true);
            let reason = self.opt_string(obj, "reason", &path);
            let install_order = self.opt_install_order(obj, "installOrder", &path);
            let format_override = self.opt_enum::<Format>(
                obj,
                "formatOverride",
                &path,
                &Format::ALL.map(|f| f.as_str()),
            );
            let format_specific = match present(obj, "formatSpecific") {
                Some(value) => self.format_specific(value, &join(&path, "formatSpecific")),
                None => BTreeMap::new(),
            };

            let Some(package_id) = package_id else {
                continue;
            };
            if !seen.insert(package_id.clone()) {
                self.push(
                    join(&path, "packageId"),
                    ViolationKind::DuplicatePackage(package_id),
                );
                continue;
            }

            packages.push(PackageRef {
                package_id,
                version,
                required,
                reason,
                install_order,
                format_override,
                format_specific,
                extra: extra_fields(obj, PACKAGE_FIELDS),
            });
        }

        packages
    }

    fn format_specific(&mut self, value: &Value, path: &str) -> BTreeMap<Format, String> {
        let Some(obj) = value.as_object() else {
            self.wrong_type(path, "object", value);
            return BTreeMap::new();
        };

        let mut out = BTreeMap::new();
        for (key, alternate) in obj {
            let entry_path = join(path, key);
            let format = match key.parse::<Format>() {
                Ok(format) => Some(format),
                Err(_) => {
                    self.push(
                        entry_path.clone(),
                        ViolationKind::UnknownVariant {
                            value: key.clone(),
                            allowed: Format::ALL.map(|f| f.as_str()).to_vec(),
                        },
                    );
                    None
                }
            };
            let alternate_id = match alternate {
                Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
                Value::String(_) => {
                    self.push(
                        entry_path,
                        ViolationKind::InvalidValue("alternate package id must not be empty".into()),
                    );
                    None
                }
                other => {
                    self.wrong_type(entry_path, "string", other);
                    None
                }
            };
            if let (Some(format), Some(alternate_id)) = (format, alternate_id) {
                out.insert(format, alternate_id);
            }
        }
        out
    }

    fn config(&mut self, value: &Value, path: &str) -> Option<CollectionConfig> {
        let Some(obj) = value.as_object() else {
            self.wrong_type(path, "object", value);
            return None;
        };

        let default_format = self.opt_enum::<Format>(
            obj,
            "defaultFormat",
            path,
            &Format::ALL.map(|f| f.as_str()),
        );
        let install_order =
            self.opt_enum::<InstallOrderMode>(obj, "installOrder", path, INSTALL_ORDER_MODES);
        let post_install = self.opt_string(obj, "postInstall", path);

        // Server internals are judged by the MCP validator, not here.
        let mcp_servers = match present(obj, "mcpServers") {
            None => BTreeMap::new(),
            Some(Value::Object(servers)) => mcp::coerce_servers(servers),
            Some(other) => {
                self.wrong_type(join(path, "mcpServers"), "object", other);
                BTreeMap::new()
            }
        };

        Some(CollectionConfig {
            default_format,
            install_order,
            post_install,
            mcp_servers,
        })
    }
}

/// A field counts as present when it exists and is not `null`.
fn present<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    obj.get(key).filter(|v| !v.is_null())
}

fn extra_fields(obj: &Map<String, Value>, known: &[&str]) -> BTreeMap<String, Value> {
    obj.iter()
        .filter(|(k, _)| !known.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

fn join(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{parent}.{key}")
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
