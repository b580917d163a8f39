use std::fmt;

use thiserror::Error;

/// What is wrong with one field of a raw definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViolationKind {
    MissingField,
    WrongType { expected: &'static str, found: &'static str },
    UnknownVariant { value: String, allowed: Vec<&'static str> },
    InvalidValue(String),
    DuplicatePackage(String),
}

/// A single structural problem, located by a JSON-style path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    /// e.g. `packages[2].version`; empty for the document root.
    pub path: String,
    pub kind: ViolationKind,
}

impl SchemaViolation {
    pub fn new(path: impl Into<String>, kind: ViolationKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = if self.path.is_empty() { "<root>" } else { &self.path };
        match &self.kind {
            ViolationKind::MissingField => write!(f, "{path}: required field is missing"),
            ViolationKind::WrongType { expected, found } => {
                write!(f, "{path}: expected {expected}, found {found}")
            }
            ViolationKind::UnknownVariant { value, allowed } => write!(
                f,
                "{path}: unknown value '{value}' (expected one of: {})",
                allowed.join(", ")
            ),
            ViolationKind::InvalidValue(msg) => write!(f, "{path}: {msg}"),
            ViolationKind::DuplicatePackage(id) => {
                write!(f, "{path}: package '{id}' is listed more than once")
            }
        }
    }
}

/// Every structural violation found in one definition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("definition has {} schema violation(s)", .violations.len())]
pub struct SchemaError {
    pub violations: Vec<SchemaViolation>,
}

impl SchemaError {
    pub fn single(violation: SchemaViolation) -> Self {
        Self {
            violations: vec![violation],
        }
    }
}

/// Errors from a definition store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("stored definition '{reference}' is invalid: {source}")]
    Invalid {
        reference: String,
        #[source]
        source: SchemaError,
    },

    #[error("stored definition '{reference}' has a malformed MCP server block: {}", .problems.join("; "))]
    McpConfig {
        reference: String,
        problems: Vec<String>,
    },

    #[error("storage error: {0}")]
    Storage(String),
}

/// Errors from a registry lookup (transport, not "package missing").
#[derive(Debug, Clone, Error)]
pub enum LookupError {
    #[error("registry unavailable: {0}")]
    Unavailable(String),

    #[error("rate limited by registry")]
    RateLimited,

    #[error("unexpected registry response: {0}")]
    InvalidResponse(String),
}
