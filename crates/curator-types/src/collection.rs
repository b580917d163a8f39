//! Collection domain types.
//!
//! A collection is a named, versioned bundle of package references that
//! together form a complete workflow. `CollectionDefinition` is the canonical
//! in-memory record produced by the schema normalizer and consumed by every
//! later validation stage.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Scope reserved for official collections (`@collection/<id>`).
pub const OFFICIAL_SCOPE: &str = "collection";

/// Version sentinel meaning "whatever the registry currently serves".
pub const LATEST_VERSION: &str = "latest";

// ---------------------------------------------------------------------------
// Enumerations
// ---------------------------------------------------------------------------

/// Fixed set of collection categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Development,
    Design,
    DataScience,
    Devops,
    Testing,
    Documentation,
    General,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Development,
        Category::Design,
        Category::DataScience,
        Category::Devops,
        Category::Testing,
        Category::Documentation,
        Category::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Development => "development",
            Category::Design => "design",
            Category::DataScience => "data-science",
            Category::Devops => "devops",
            Category::Testing => "testing",
            Category::Documentation => "documentation",
            Category::General => "general",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("invalid category: '{s}'"))
    }
}

/// Editor formats a package can be delivered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Cursor,
    Claude,
    Continue,
    Windsurf,
}

impl Format {
    pub const ALL: [Format; 4] = [Format::Cursor, Format::Claude, Format::Continue, Format::Windsurf];

    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Cursor => "cursor",
            Format::Claude => "claude",
            Format::Continue => "continue",
            Format::Windsurf => "windsurf",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Format::ALL
            .into_iter()
            .find(|fmt| fmt.as_str() == s)
            .ok_or_else(|| format!("invalid format: '{s}'"))
    }
}

/// How a consumer should install the packages of a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallOrderMode {
    Sequential,
    Parallel,
}

impl fmt::Display for InstallOrderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstallOrderMode::Sequential => write!(f, "sequential"),
            InstallOrderMode::Parallel => write!(f, "parallel"),
        }
    }
}

impl FromStr for InstallOrderMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sequential" => Ok(InstallOrderMode::Sequential),
            "parallel" => Ok(InstallOrderMode::Parallel),
            other => Err(format!("invalid install order mode: '{other}'")),
        }
    }
}

// ---------------------------------------------------------------------------
// Definition
// ---------------------------------------------------------------------------

/// The root entity: one collection as authored by a human or an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionDefinition {
    /// Slug, unique within `scope`.
    pub id: String,
    /// Owner namespace, or [`OFFICIAL_SCOPE`].
    pub scope: String,
    pub name: String,
    pub description: String,
    pub version: semver::Version,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub framework: Option<String>,
    pub icon: String,
    #[serde(default)]
    pub official: bool,
    #[serde(default)]
    pub verified: bool,
    /// Install order is the list order unless `installOrder` says otherwise.
    pub packages: Vec<PackageRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<CollectionConfig>,
    /// Parent reference (`@scope/id`, `scope/id` or a bare id).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,
    /// Fields this version does not understand, kept verbatim.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl CollectionDefinition {
    /// `@scope/id`, the display form used in logs and messages.
    pub fn qualified_id(&self) -> String {
        format!("@{}/{}", self.scope, self.id)
    }

    /// Whether this collection claims official status, either through the
    /// reserved scope or the `official` flag.
    pub fn is_official(&self) -> bool {
        self.official || self.scope == OFFICIAL_SCOPE
    }

    pub fn package(&self, package_id: &str) -> Option<&PackageRef> {
        self.packages.iter().find(|p| p.package_id == package_id)
    }

    pub fn mcp_servers(&self) -> Option<&BTreeMap<String, McpServerConfig>> {
        self.config.as_ref().map(|c| &c.mcp_servers)
    }
}

/// One package's membership in a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageRef {
    pub package_id: String,
    /// Semver range or [`LATEST_VERSION`].
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default = "default_true")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install_order: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format_override: Option<Format>,
    /// Alternate package ids to install for a given format.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub format_specific: BTreeMap<Format, String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl PackageRef {
    pub fn new(package_id: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            package_id: package_id.into(),
            version: version.into(),
            required: true,
            reason: None,
            install_order: None,
            format_override: None,
            format_specific: BTreeMap::new(),
            extra: BTreeMap::new(),
        }
    }

    pub fn is_latest(&self) -> bool {
        self.version == LATEST_VERSION
    }

    /// True when `reason` is present and not just whitespace.
    pub fn has_reason(&self) -> bool {
        self.reason.as_deref().is_some_and(|r| !r.trim().is_empty())
    }
}

fn default_version() -> String {
    LATEST_VERSION.to_string()
}

fn default_true() -> bool {
    true
}

/// Collection-wide installation settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_format: Option<Format>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install_order: Option<InstallOrderMode>,
    /// Opaque to the validator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_install: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub mcp_servers: BTreeMap<String, McpServerConfig>,
}

/// A Model Context Protocol server shipped alongside a collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct McpServerConfig {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub optional: bool,
}

// ---------------------------------------------------------------------------
// Parent references
// ---------------------------------------------------------------------------

/// A parsed `extends` value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CollectionRef {
    pub scope: String,
    pub id: String,
}

impl CollectionRef {
    /// Parse `@scope/id`, `scope/id` or a bare `id`. Bare ids inherit
    /// `default_scope`.
    pub fn parse(raw: &str, default_scope: &str) -> Result<Self, String> {
        let trimmed = raw.trim();
        let body = trimmed.strip_prefix('@').unwrap_or(trimmed);
        let (scope, id) = match body.split_once('/') {
            Some((scope, id)) => (scope, id),
            None if trimmed.starts_with('@') => {
                return Err(format!("collection reference '{raw}' is missing an id"));
            }
            None => (default_scope, body),
        };

        if scope.is_empty() || id.is_empty() || id.contains('/') {
            return Err(format!("malformed collection reference: '{raw}'"));
        }

        Ok(Self {
            scope: scope.to_string(),
            id: id.to_string(),
        })
    }
}

impl fmt::Display for CollectionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}/{}", self.scope, self.id)
    }
}
