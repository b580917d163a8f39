//! Types exchanged with candidate discovery sources.
//!
//! Discovery (for example an LLM-guided registry search) proposes packages;
//! it never decides validity. Its output feeds a draft definition which then
//! goes through normal validation.

use serde::{Deserialize, Serialize};

use crate::collection::{Category, Format};

/// What the author is trying to assemble.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestCriteria {
    /// Free-text goal, e.g. "Next.js app with Tailwind and Playwright".
    pub goal: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub framework: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<Format>,
    #[serde(default)]
    pub limit: usize,
}

/// A package proposed for inclusion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidatePackageRef {
    pub package_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Relevance in `[0, 1]`; higher is better.
    pub score: f64,
    /// Why the source proposed it; becomes the package `reason`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
}
