//! Quality rules for composed collections.
//!
//! Each rule is a plain function over the definition and the thresholds.
//! Rules run in a fixed order, so findings come out in the same order for
//! the same input.

use std::collections::BTreeMap;

use curator_types::collection::{Category, CollectionDefinition, OFFICIAL_SCOPE};
use curator_types::config::QualityConfig;
use curator_types::report::{Finding, FindingCode, QualityReport, Severity};

type Rule = fn(&CollectionDefinition, &QualityConfig) -> Vec<Finding>;

const RULES: &[Rule] = &[
    min_package_count,
    required_ratio,
    missing_reason,
    install_order_uniqueness,
    tag_cardinality,
    category_presence,
    version_pinning,
    description_length,
    official_scope,
];

/// Slack for comparing ratios against configured bounds.
const RATIO_EPSILON: f64 = 1e-9;

pub struct QualityEngine {
    config: QualityConfig,
}

impl QualityEngine {
    pub fn new(config: QualityConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &QualityConfig {
        &self.config
    }

    /// Run every rule against `def`.
    ///
    /// With `strict_official` set, warnings listed in `strict_escalations`
    /// become errors for official collections.
    pub fn evaluate(&self, def: &CollectionDefinition) -> QualityReport {
        let mut findings: Vec<Finding> = RULES
            .iter()
            .flat_map(|rule| rule(def, &self.config))
            .collect();

        if self.config.strict_official && def.is_official() {
            for finding in &mut findings {
                if finding.severity == Severity::Warning
                    && self.config.strict_escalations.contains(&finding.code)
                {
                    finding.severity = Severity::Error;
                }
            }
        }

        tracing::debug!(
            collection = %def.qualified_id(),
            findings = findings.len(),
            "quality rules evaluated"
        );
        QualityReport { findings }
    }
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

fn min_package_count(def: &CollectionDefinition, config: &QualityConfig) -> Vec<Finding> {
    let count = def.packages.len();
    if count >= config.min_packages {
        return Vec::new();
    }
    vec![Finding::error(
        FindingCode::MinPackageCount,
        format!(
            "collection has {count} package(s); at least {} are required",
            config.min_packages
        ),
    )]
}

fn required_ratio(def: &CollectionDefinition, config: &QualityConfig) -> Vec<Finding> {
    if def.packages.is_empty() {
        return Vec::new();
    }
    let required = def.packages.iter().filter(|p| p.required).count();
    let ratio = required as f64 / def.packages.len() as f64;

    if ratio + RATIO_EPSILON >= config.required_ratio_min
        && ratio - RATIO_EPSILON <= config.required_ratio_max
    {
        return Vec::new();
    }
    vec![Finding::warning(
        FindingCode::RequiredRatio,
        format!(
            "{required} of {} packages are required ({:.0}%); expected between {:.0}% and {:.0}%",
            def.packages.len(),
            ratio * 100.0,
            config.required_ratio_min * 100.0,
            config.required_ratio_max * 100.0
        ),
    )]
}

fn missing_reason(def: &CollectionDefinition, _config: &QualityConfig) -> Vec<Finding> {
    def.packages
        .iter()
        .filter(|p| !p.has_reason())
        .map(|p| {
            Finding::warning(
                FindingCode::MissingReason,
                format!("package '{}' has no reason for inclusion", p.package_id),
            )
            .for_package(&p.package_id)
        })
        .collect()
}

fn install_order_uniqueness(def: &CollectionDefinition, _config: &QualityConfig) -> Vec<Finding> {
    let mut first_by_order: BTreeMap<u32, &str> = BTreeMap::new();
    let mut findings = Vec::new();

    for pkg in &def.packages {
        let Some(order) = pkg.install_order else {
            continue;
        };
        match first_by_order.get(&order) {
            Some(first) => findings.push(
                Finding::error(
                    FindingCode::InstallOrderUniqueness,
                    format!(
                        "package '{}' reuses install order {order} already taken by '{first}'",
                        pkg.package_id
                    ),
                )
                .for_package(&pkg.package_id),
            ),
            None => {
                first_by_order.insert(order, &pkg.package_id);
            }
        }
    }
    findings
}

fn tag_cardinality(def: &CollectionDefinition, config: &QualityConfig) -> Vec<Finding> {
    let count = def.tags.len();
    if (config.min_tags..=config.max_tags).contains(&count) {
        return Vec::new();
    }
    vec![Finding::warning(
        FindingCode::TagCardinality,
        format!(
            "collection has {count} tag(s); expected between {} and {}",
            config.min_tags, config.max_tags
        ),
    )]
}

fn category_presence(def: &CollectionDefinition, _config: &QualityConfig) -> Vec<Finding> {
    if def.category.is_some() {
        return Vec::new();
    }
    let allowed: Vec<&str> = Category::ALL.iter().map(Category::as_str).collect();
    vec![Finding::error(
        FindingCode::CategoryPresence,
        format!("collection has no category; expected one of: {}", allowed.join(", ")),
    )]
}

fn version_pinning(def: &CollectionDefinition, _config: &QualityConfig) -> Vec<Finding> {
    if def.packages.is_empty() || !def.packages.iter().all(|p| p.is_latest()) {
        return Vec::new();
    }
    vec![Finding::warning(
        FindingCode::VersionPinning,
        "every package tracks 'latest'; pin at least one version range",
    )]
}

fn description_length(def: &CollectionDefinition, config: &QualityConfig) -> Vec<Finding> {
    let chars = def.description.trim().chars().count();
    if chars >= config.min_description_chars {
        return Vec::new();
    }
    vec![Finding::warning(
        FindingCode::DescriptionLength,
        format!(
            "description is {chars} characters; at least {} recommended",
            config.min_description_chars
        ),
    )]
}

fn official_scope(def: &CollectionDefinition, _config: &QualityConfig) -> Vec<Finding> {
    let in_official_scope = def.scope == OFFICIAL_SCOPE;
    let message = match (def.official, in_official_scope) {
        (true, false) => format!(
            "collection is marked official but lives in scope '{}' instead of '{OFFICIAL_SCOPE}'",
            def.scope
        ),
        (false, true) => format!(
            "collection uses the reserved '{OFFICIAL_SCOPE}' scope but is not marked official"
        ),
        _ => return Vec::new(),
    };
    vec![Finding::warning(FindingCode::OfficialScope, message)]
}
