//! Candidate discovery and draft package lists.
//!
//! A [`CandidateSource`] (registry search, an LLM agent, a curated list)
//! proposes packages for a goal. [`draft_packages`] turns the proposals into
//! package references for a draft definition. Drafts carry no authority;
//! they still go through the validation pipeline like any other definition.

use std::collections::BTreeMap;

use anyhow::Context;
use curator_types::collection::{PackageRef, LATEST_VERSION};
use curator_types::discovery::{CandidatePackageRef, SuggestCriteria};
use serde::{Deserialize, Serialize};

/// Something that can propose packages for a collection.
pub trait CandidateSource: Send + Sync {
    fn suggest(
        &self,
        criteria: &SuggestCriteria,
    ) -> impl std::future::Future<Output = anyhow::Result<Vec<CandidatePackageRef>>> + Send;
}

/// How proposals become package references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftOptions {
    /// Fraction of the drafted packages (highest scores first) marked required.
    #[serde(default = "default_required_fraction")]
    pub required_fraction: f64,
    #[serde(default = "default_max_packages")]
    pub max_packages: usize,
}

fn default_required_fraction() -> f64 {
    0.6
}

fn default_max_packages() -> usize {
    10
}

impl Default for DraftOptions {
    fn default() -> Self {
        Self {
            required_fraction: default_required_fraction(),
            max_packages: default_max_packages(),
        }
    }
}

/// Ask `source` for candidates and draft them into package references.
pub async fn suggest_packages<C: CandidateSource>(
    source: &C,
    criteria: &SuggestCriteria,
    options: &DraftOptions,
) -> anyhow::Result<Vec<PackageRef>> {
    let candidates = source
        .suggest(criteria)
        .await
        .with_context(|| format!("candidate source failed for goal '{}'", criteria.goal))?;
    tracing::debug!(
        goal = %criteria.goal,
        candidates = candidates.len(),
        "received package candidates"
    );
    Ok(draft_packages(candidates, options))
}

/// Build an ordered package list from scored candidates.
///
/// Duplicate ids keep their best score. Candidates with a non-finite score
/// are dropped. Output is ordered by score (ties by id), numbered from 1,
/// and the top `required_fraction` (rounded up) is marked required.
pub fn draft_packages(candidates: Vec<CandidatePackageRef>, options: &DraftOptions) -> Vec<PackageRef> {
    let mut best: BTreeMap<String, CandidatePackageRef> = BTreeMap::new();
    for candidate in candidates.into_iter().filter(|c| c.score.is_finite()) {
        match best.get(&candidate.package_id) {
            Some(existing) if existing.score >= candidate.score => {}
            _ => {
                best.insert(candidate.package_id.clone(), candidate);
            }
        }
    }

    let mut ranked: Vec<CandidatePackageRef> = best.into_values().collect();
    ranked.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.package_id.cmp(&b.package_id))
    });
    ranked.truncate(options.max_packages);

    let fraction = options.required_fraction.clamp(0.0, 1.0);
    let required_count = (ranked.len() as f64 * fraction - 1e-9).ceil().max(0.0) as usize;

    ranked
        .into_iter()
        .enumerate()
        .map(|(i, candidate)| {
            let version = candidate
                .version
                .unwrap_or_else(|| LATEST_VERSION.to_string());
            let mut pkg = PackageRef::new(candidate.package_id, version);
            pkg.required = i < required_count;
            pkg.reason = candidate.rationale;
            pkg.install_order = u32::try_from(i + 1).ok();
            pkg
        })
        .collect()
}
