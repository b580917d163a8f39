//! Package reference resolution against the registry.
//!
//! Every distinct `(packageId, version)` pair, including format-specific
//! alternates, is looked up concurrently through a `JoinSet`, bounded by a
//! semaphore. Each lookup carries its own timeout. Individual failures are
//! recorded and never abort the rest; only cancellation stops the run.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;

use curator_types::collection::{CollectionDefinition, PackageRef};
use curator_types::config::ResolutionConfig;
use curator_types::report::{Finding, FindingCode, Severity};
use curator_types::resolution::{
    AlternateResolution, ResolutionOutcome, ResolutionReport, ResolutionResult, UnresolvedReason,
};
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::repository::registry::RegistryLookup;

/// Resolution does not fail per package; this only signals that the caller
/// gave up.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("resolution cancelled")]
    Cancelled,
}

type LookupKey = (String, String);

/// Bounded, cancellable resolver over a shared registry client.
pub struct PackageResolver<L: RegistryLookup> {
    registry: Arc<L>,
    max_concurrency: usize,
    lookup_timeout: Duration,
}

impl<L: RegistryLookup + 'static> PackageResolver<L> {
    pub fn new(registry: Arc<L>, config: &ResolutionConfig) -> Self {
        Self::with_limits(
            registry,
            config.max_concurrency,
            Duration::from_millis(config.lookup_timeout_ms),
        )
    }

    pub fn with_limits(registry: Arc<L>, max_concurrency: usize, lookup_timeout: Duration) -> Self {
        Self {
            registry,
            max_concurrency: max_concurrency.max(1),
            lookup_timeout,
        }
    }

    /// Resolve every reference in `packages`.
    ///
    /// The report is keyed by package id, so the order of `packages` and the
    /// completion order of lookups do not affect it. On cancellation the
    /// in-flight lookups are aborted and no report is produced.
    pub async fn resolve(
        &self,
        packages: &[PackageRef],
        cancel: &CancellationToken,
    ) -> Result<ResolutionReport, ResolveError> {
        let keys: BTreeSet<LookupKey> = packages
            .iter()
            .flat_map(|pkg| {
                std::iter::once(pkg.package_id.clone())
                    .chain(pkg.format_specific.values().cloned())
                    .map(|id| (id, pkg.version.clone()))
            })
            .collect();

        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut join_set = JoinSet::new();

        for (package_id, version) in keys {
            let registry = Arc::clone(&self.registry);
            let semaphore = Arc::clone(&semaphore);
            let timeout = self.lookup_timeout;

            join_set.spawn(async move {
                let outcome = match semaphore.acquire_owned().await {
                    Ok(_permit) => lookup_one(registry.as_ref(), &package_id, &version, timeout).await,
                    Err(_) => ResolutionOutcome::Unresolved(UnresolvedReason::LookupFailed {
                        error: "lookup pool closed".to_string(),
                    }),
                };
                ((package_id, version), outcome)
            });
        }

        let mut outcomes: HashMap<LookupKey, ResolutionOutcome> = HashMap::new();
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    join_set.abort_all();
                    tracing::debug!(pending = join_set.len(), "resolution cancelled");
                    return Err(ResolveError::Cancelled);
                }
                next = join_set.join_next() => match next {
                    Some(Ok((key, outcome))) => {
                        outcomes.insert(key, outcome);
                    }
                    Some(Err(e)) => {
                        tracing::warn!(error = %e, "registry lookup task failed");
                    }
                    None => break,
                }
            }
        }

        let outcome_for = |package_id: &str, version: &str| {
            outcomes
                .get(&(package_id.to_string(), version.to_string()))
                .cloned()
                .unwrap_or_else(|| {
                    ResolutionOutcome::Unresolved(UnresolvedReason::LookupFailed {
                        error: "lookup did not complete".to_string(),
                    })
                })
        };

        let mut report = ResolutionReport::default();
        for pkg in packages {
            report.packages.insert(
                pkg.package_id.clone(),
                outcome_for(&pkg.package_id, &pkg.version),
            );
            for (format, alternate_id) in &pkg.format_specific {
                report.alternates.push(AlternateResolution {
                    package_id: pkg.package_id.clone(),
                    format: *format,
                    alternate_id: alternate_id.clone(),
                    outcome: outcome_for(alternate_id, &pkg.version),
                });
            }
        }
        report
            .alternates
            .sort_by(|a, b| (&a.package_id, a.format).cmp(&(&b.package_id, b.format)));

        tracing::debug!(
            packages = report.packages.len(),
            unresolved = report.unresolved().count(),
            "resolution finished"
        );
        Ok(report)
    }
}

async fn lookup_one<L: RegistryLookup>(
    registry: &L,
    package_id: &str,
    version: &str,
    timeout: Duration,
) -> ResolutionOutcome {
    match tokio::time::timeout(timeout, registry.lookup(package_id, version)).await {
        Ok(Ok(ResolutionResult::Found(resolved))) => ResolutionOutcome::Resolved(resolved),
        Ok(Ok(ResolutionResult::NotFound)) => {
            ResolutionOutcome::Unresolved(UnresolvedReason::NotFound)
        }
        Ok(Ok(ResolutionResult::VersionMismatch { available })) => {
            ResolutionOutcome::Unresolved(UnresolvedReason::VersionMismatch {
                requested: version.to_string(),
                available,
            })
        }
        Ok(Err(e)) => {
            tracing::warn!(package_id, version, error = %e, "registry lookup failed");
            ResolutionOutcome::Unresolved(UnresolvedReason::LookupFailed {
                error: e.to_string(),
            })
        }
        Err(_) => {
            let after_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
            tracing::warn!(package_id, version, after_ms, "registry lookup timed out");
            ResolutionOutcome::Unresolved(UnresolvedReason::Timeout { after_ms })
        }
    }
}

/// Turn a resolution report into findings, in package order.
///
/// Unresolved required packages block; unresolved optional packages and
/// format-specific alternates only warn.
pub fn resolution_findings(def: &CollectionDefinition, report: &ResolutionReport) -> Vec<Finding> {
    let mut findings = Vec::new();

    for pkg in &def.packages {
        if let Some(reason) = report
            .outcome(&pkg.package_id)
            .and_then(ResolutionOutcome::unresolved_reason)
        {
            let severity = if pkg.required {
                Severity::Error
            } else {
                Severity::Warning
            };
            let kind = if pkg.required { "required" } else { "optional" };
            findings.push(Finding {
                severity,
                code: FindingCode::ResolutionFailure,
                message: format!(
                    "{kind} package '{}@{}' could not be resolved ({}): {reason}",
                    pkg.package_id,
                    pkg.version,
                    reason.code()
                ),
                package_id: Some(pkg.package_id.clone()),
            });
        }

        for alt in report
            .alternates
            .iter()
            .filter(|a| a.package_id == pkg.package_id)
        {
            if let Some(reason) = alt.outcome.unresolved_reason() {
                findings.push(
                    Finding::warning(
                        FindingCode::FormatAlternateUnresolved,
                        format!(
                            "{} alternate '{}' could not be resolved ({}): {reason}",
                            alt.format,
                            alt.alternate_id,
                            reason.code()
                        ),
                    )
                    .for_package(&pkg.package_id),
                );
            }
        }
    }

    findings
}
