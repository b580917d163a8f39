//! Package resolution results.
//!
//! The registry answers per `(packageId, version)`; the resolver aggregates
//! the answers into a `ResolutionReport` keyed by package id so concurrent
//! completion order never shows up in the output.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::collection::Format;

/// Registry metadata for a package that resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedPackage {
    pub package_id: String,
    /// Concrete version the requested range resolved to.
    pub version: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub formats: Vec<Format>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// What a registry lookup returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ResolutionResult {
    Found(ResolvedPackage),
    NotFound,
    VersionMismatch { available: Vec<String> },
}

/// Why a reference could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum UnresolvedReason {
    NotFound,
    VersionMismatch { requested: String, available: Vec<String> },
    /// The lookup exceeded its timeout; treated like `NotFound` for
    /// validation but reported distinctly.
    Timeout { after_ms: u64 },
    LookupFailed { error: String },
}

impl UnresolvedReason {
    /// Stable reason code.
    pub fn code(&self) -> &'static str {
        match self {
            UnresolvedReason::NotFound => "not_found",
            UnresolvedReason::VersionMismatch { .. } => "version_mismatch",
            UnresolvedReason::Timeout { .. } => "timeout",
            UnresolvedReason::LookupFailed { .. } => "lookup_failed",
        }
    }
}

impl fmt::Display for UnresolvedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnresolvedReason::NotFound => write!(f, "not found in registry"),
            UnresolvedReason::VersionMismatch { requested, available } => {
                if available.is_empty() {
                    write!(f, "no published version satisfies '{requested}'")
                } else {
                    write!(
                        f,
                        "no published version satisfies '{requested}' (available: {})",
                        available.join(", ")
                    )
                }
            }
            UnresolvedReason::Timeout { after_ms } => {
                write!(f, "registry lookup timed out after {after_ms}ms")
            }
            UnresolvedReason::LookupFailed { error } => write!(f, "registry lookup failed: {error}"),
        }
    }
}

/// Per-reference result after resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ResolutionOutcome {
    Resolved(ResolvedPackage),
    Unresolved(UnresolvedReason),
}

impl ResolutionOutcome {
    pub fn is_resolved(&self) -> bool {
        matches!(self, ResolutionOutcome::Resolved(_))
    }

    pub fn unresolved_reason(&self) -> Option<&UnresolvedReason> {
        match self {
            ResolutionOutcome::Unresolved(reason) => Some(reason),
            ResolutionOutcome::Resolved(_) => None,
        }
    }
}

/// Resolution of a format-specific alternate package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlternateResolution {
    /// The collection member the alternate belongs to.
    pub package_id: String,
    pub format: Format,
    pub alternate_id: String,
    pub outcome: ResolutionOutcome,
}

/// Aggregate of every lookup made for one definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionReport {
    /// Keyed by `packageId`.
    pub packages: BTreeMap<String, ResolutionOutcome>,
    /// Sorted by `(packageId, format)`.
    pub alternates: Vec<AlternateResolution>,
}

impl ResolutionReport {
    pub fn outcome(&self, package_id: &str) -> Option<&ResolutionOutcome> {
        self.packages.get(package_id)
    }

    pub fn resolved_ids(&self) -> impl Iterator<Item = &str> {
        self.packages
            .iter()
            .filter(|(_, o)| o.is_resolved())
            .map(|(id, _)| id.as_str())
    }

    pub fn unresolved(&self) -> impl Iterator<Item = (&str, &UnresolvedReason)> {
        self.packages
            .iter()
            .filter_map(|(id, o)| o.unresolved_reason().map(|r| (id.as_str(), r)))
    }

    pub fn is_fully_resolved(&self) -> bool {
        self.packages.values().all(ResolutionOutcome::is_resolved)
            && self.alternates.iter().all(|a| a.outcome.is_resolved())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_codes_are_stable() {
        assert_eq!(UnresolvedReason::NotFound.code(), "not_found");
        assert_eq!(UnresolvedReason::Timeout { after_ms: 10 }.code(), "timeout");
        assert_eq!(
            UnresolvedReason::LookupFailed { error: "x".into() }.code(),
            "lookup_failed"
        );
    }

    #[test]
    fn test_version_mismatch_lists_available() {
        let reason = UnresolvedReason::VersionMismatch {
            requested: "^3.0.0".into(),
            available: vec!["1.0.0".into(), "2.1.0".into()],
        };
        assert_eq!(
            reason.to_string(),
            "no published version satisfies '^3.0.0' (available: 1.0.0, 2.1.0)"
        );
    }

    #[test]
    fn test_report_partitions_outcomes() {
        let mut report = ResolutionReport::default();
        report.packages.insert(
            "a".into(),
            ResolutionOutcome::Resolved(ResolvedPackage {
                package_id: "a".into(),
                version: "1.0.0".into(),
                formats: vec![],
                description: None,
            }),
        );
        report
            .packages
            .insert("b".into(), ResolutionOutcome::Unresolved(UnresolvedReason::NotFound));

        assert_eq!(report.resolved_ids().collect::<Vec<_>>(), vec!["a"]);
        assert_eq!(report.unresolved().count(), 1);
        assert!(!report.is_fully_resolved());
    }
}
