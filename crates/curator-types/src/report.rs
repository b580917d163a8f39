//! Findings and reports produced by validation.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::collection::CollectionDefinition;

/// Whether a finding blocks publication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// Stable machine-readable finding codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FindingCode {
    SchemaError,
    InheritanceError,
    McpConfigError,
    ResolutionFailure,
    FormatAlternateUnresolved,
    MinPackageCount,
    RequiredRatio,
    MissingReason,
    InstallOrderUniqueness,
    TagCardinality,
    CategoryPresence,
    VersionPinning,
    DescriptionLength,
    OfficialScope,
}

impl FindingCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FindingCode::SchemaError => "SchemaError",
            FindingCode::InheritanceError => "InheritanceError",
            FindingCode::McpConfigError => "McpConfigError",
            FindingCode::ResolutionFailure => "ResolutionFailure",
            FindingCode::FormatAlternateUnresolved => "FormatAlternateUnresolved",
            FindingCode::MinPackageCount => "MinPackageCount",
            FindingCode::RequiredRatio => "RequiredRatio",
            FindingCode::MissingReason => "MissingReason",
            FindingCode::InstallOrderUniqueness => "InstallOrderUniqueness",
            FindingCode::TagCardinality => "TagCardinality",
            FindingCode::CategoryPresence => "CategoryPresence",
            FindingCode::VersionPinning => "VersionPinning",
            FindingCode::DescriptionLength => "DescriptionLength",
            FindingCode::OfficialScope => "OfficialScope",
        }
    }
}

impl fmt::Display for FindingCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One problem found in a definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    pub severity: Severity,
    pub code: FindingCode,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_id: Option<String>,
}

impl Finding {
    pub fn error(code: FindingCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
            package_id: None,
        }
    }

    pub fn warning(code: FindingCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
            package_id: None,
        }
    }

    pub fn for_package(mut self, package_id: impl Into<String>) -> Self {
        self.package_id = Some(package_id.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.package_id {
            Some(pkg) => write!(f, "[{}] {} ({}): {}", self.severity, self.code, pkg, self.message),
            None => write!(f, "[{}] {}: {}", self.severity, self.code, self.message),
        }
    }
}

/// Output of the quality rule engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityReport {
    pub findings: Vec<Finding>,
}

impl QualityReport {
    pub fn passes(&self) -> bool {
        !self.findings.iter().any(Finding::is_error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|f| f.is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|f| !f.is_error())
    }
}

/// Stages of the validation pipeline, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineStage {
    Received,
    Normalized,
    Composed,
    Resolved,
    Evaluated,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineStage::Received => write!(f, "received"),
            PipelineStage::Normalized => write!(f, "normalized"),
            PipelineStage::Composed => write!(f, "composed"),
            PipelineStage::Resolved => write!(f, "resolved"),
            PipelineStage::Evaluated => write!(f, "evaluated"),
        }
    }
}

/// Terminal state of a validation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Accepted,
    Rejected,
}

/// The single document handed back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub outcome: Outcome,
    /// Last stage that completed before the outcome was decided.
    pub stage: PipelineStage,
    pub findings: Vec<Finding>,
    /// The composed definition, once composition succeeded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition: Option<CollectionDefinition>,
}

impl ValidationReport {
    /// Build a report whose outcome follows from its findings.
    pub fn from_findings(
        stage: PipelineStage,
        findings: Vec<Finding>,
        definition: Option<CollectionDefinition>,
    ) -> Self {
        let outcome = if findings.iter().any(Finding::is_error) {
            Outcome::Rejected
        } else {
            Outcome::Accepted
        };
        Self {
            outcome,
            stage,
            findings,
            definition,
        }
    }

    /// Minimal report for a stage that failed structurally.
    pub fn rejected(stage: PipelineStage, findings: Vec<Finding>) -> Self {
        Self {
            outcome: Outcome::Rejected,
            stage,
            findings,
            definition: None,
        }
    }

    pub fn is_accepted(&self) -> bool {
        self.outcome == Outcome::Accepted
    }

    pub fn has_code(&self, code: FindingCode) -> bool {
        self.findings.iter().any(|f| f.code == code)
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.findings.iter().filter(|f| f.severity == severity).count()
    }
}
