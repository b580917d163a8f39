//! The validation pipeline.
//!
//! Stages run strictly in order:
//!
//! ```text
//! Received -> Normalized -> Composed -> Resolved -> Evaluated -> Accepted | Rejected
//! ```
//!
//! Structural failures (schema, MCP block, inheritance) stop the run with a
//! minimal rejected report. Later stages collect findings and the outcome is
//! decided once, from all of them. Composition runs before resolution so
//! that inherited packages are resolved too.

use std::sync::Arc;

use curator_types::collection::CollectionDefinition;
use curator_types::config::ValidatorConfig;
use curator_types::error::{SchemaError, StoreError};
use curator_types::report::{Finding, FindingCode, PipelineStage, Severity, ValidationReport};
use serde_json::Value;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use super::inheritance::{self, InheritanceError};
use super::mcp;
use super::quality::QualityEngine;
use super::resolver::{resolution_findings, PackageResolver, ResolveError};
use super::schema::{self, DefinitionFormat};
use crate::repository::registry::RegistryLookup;
use crate::repository::store::DefinitionStore;

/// A run that produced no report.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("validation cancelled")]
    Cancelled,
}

impl From<ResolveError> for ValidationError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::Cancelled => ValidationError::Cancelled,
        }
    }
}

/// Validates collection definitions end to end.
///
/// Holds no per-run state; one validator can serve many concurrent runs.
pub struct CollectionValidator<L: RegistryLookup, S: DefinitionStore> {
    resolver: PackageResolver<L>,
    store: Arc<S>,
    quality: QualityEngine,
}

impl<L, S> CollectionValidator<L, S>
where
    L: RegistryLookup + 'static,
    S: DefinitionStore,
{
    pub fn new(registry: Arc<L>, store: Arc<S>, config: ValidatorConfig) -> Self {
        let config = config.sanitized();
        Self {
            resolver: PackageResolver::new(registry, &config.resolution),
            store,
            quality: QualityEngine::new(config.quality),
        }
    }

    /// Validate a definition from text in the given format.
    pub async fn validate_text(
        &self,
        text: &str,
        format: DefinitionFormat,
        cancel: &CancellationToken,
    ) -> Result<ValidationReport, ValidationError> {
        match schema::parse_value(text, format) {
            Ok(raw) => self.validate_document(&raw, cancel).await,
            Err(err) => Ok(schema_rejection(&err)),
        }
    }

    /// Validate an untyped document, as received from a file or an agent.
    pub async fn validate_document(
        &self,
        raw: &Value,
        cancel: &CancellationToken,
    ) -> Result<ValidationReport, ValidationError> {
        let definition = match schema::normalize(raw) {
            Ok(def) => def,
            Err(err) => {
                tracing::info!(
                    violations = err.violations.len(),
                    "definition rejected by schema"
                );
                return Ok(schema_rejection(&err));
            }
        };

        let mcp_findings = mcp::raw_servers(raw)
            .map(mcp::validate_raw_mcp_servers)
            .unwrap_or_default();
        if !mcp_findings.is_empty() {
            return Ok(mcp_rejection(
                &definition.qualified_id(),
                PipelineStage::Normalized,
                mcp_findings,
            ));
        }

        self.run_normalized(definition, cancel).await
    }

    /// Validate an already typed definition.
    ///
    /// Typed values can still break slug and emptiness rules, so they take
    /// the same path as untyped documents.
    pub async fn validate(
        &self,
        definition: &CollectionDefinition,
        cancel: &CancellationToken,
    ) -> Result<ValidationReport, ValidationError> {
        match serde_json::to_value(definition) {
            Ok(raw) => self.validate_document(&raw, cancel).await,
            Err(e) => Ok(ValidationReport::rejected(
                PipelineStage::Received,
                vec![Finding::error(
                    FindingCode::SchemaError,
                    format!("definition could not be serialized: {e}"),
                )],
            )),
        }
    }

    async fn run_normalized(
        &self,
        definition: CollectionDefinition,
        cancel: &CancellationToken,
    ) -> Result<ValidationReport, ValidationError> {
        let collection = definition.qualified_id();
        tracing::debug!(%collection, stage = %PipelineStage::Normalized, "stage complete");

        let composed = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ValidationError::Cancelled),
            composed = inheritance::compose(definition, self.store.as_ref()) => composed,
        };
        let composed = match composed {
            Ok(def) => def,
            Err(InheritanceError::Store {
                source: StoreError::McpConfig { reference, problems },
                ..
            }) => {
                let findings = problems
                    .into_iter()
                    .map(|problem| {
                        Finding::error(
                            FindingCode::McpConfigError,
                            format!("inherited from {reference}: {problem}"),
                        )
                    })
                    .collect();
                return Ok(mcp_rejection(&collection, PipelineStage::Normalized, findings));
            }
            Err(err) => {
                tracing::info!(%collection, error = %err, "inheritance failed");
                return Ok(ValidationReport::rejected(
                    PipelineStage::Normalized,
                    vec![Finding::error(FindingCode::InheritanceError, err.to_string())],
                ));
            }
        };

        // Inherited servers have not been checked yet.
        let mcp_findings = composed
            .mcp_servers()
            .map(mcp::validate_mcp_servers)
            .unwrap_or_default();
        if !mcp_findings.is_empty() {
            return Ok(mcp_rejection(&collection, PipelineStage::Composed, mcp_findings));
        }
        tracing::debug!(
            %collection,
            stage = %PipelineStage::Composed,
            packages = composed.packages.len(),
            "stage complete"
        );

        let resolution = self.resolver.resolve(&composed.packages, cancel).await?;
        let mut findings = resolution_findings(&composed, &resolution);
        tracing::debug!(
            %collection,
            stage = %PipelineStage::Resolved,
            unresolved = resolution.unresolved().count(),
            "stage complete"
        );

        findings.extend(self.quality.evaluate(&composed).findings);

        let report = ValidationReport::from_findings(PipelineStage::Evaluated, findings, Some(composed));
        tracing::info!(
            %collection,
            outcome = ?report.outcome,
            errors = report.count(Severity::Error),
            warnings = report.count(Severity::Warning),
            "collection validated"
        );
        Ok(report)
    }
}

fn schema_rejection(err: &SchemaError) -> ValidationReport {
    let findings = err
        .violations
        .iter()
        .map(|v| Finding::error(FindingCode::SchemaError, v.to_string()))
        .collect();
    ValidationReport::rejected(PipelineStage::Received, findings)
}

fn mcp_rejection(collection: &str, stage: PipelineStage, findings: Vec<Finding>) -> ValidationReport {
    tracing::info!(
        collection,
        problems = findings.len(),
        "MCP server configuration rejected"
    );
    ValidationReport::rejected(stage, findings)
}
