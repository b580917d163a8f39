//! Validator configuration.
//!
//! `ValidatorConfig` is the deserialized form of `curator.toml`. Every field
//! has a default so an empty or partial file is valid.

use serde::{Deserialize, Serialize};

use crate::report::FindingCode;

/// Top-level validator configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidatorConfig {
    #[serde(default)]
    pub quality: QualityConfig,
    #[serde(default)]
    pub resolution: ResolutionConfig,
}

impl ValidatorConfig {
    /// Repair values that would make the rules meaningless: non-finite or
    /// swapped bounds, zero concurrency, zero timeout.
    pub fn sanitized(mut self) -> Self {
        let q = &mut self.quality;
        if !q.required_ratio_min.is_finite() {
            q.required_ratio_min = default_required_ratio_min();
        }
        if !q.required_ratio_max.is_finite() {
            q.required_ratio_max = default_required_ratio_max();
        }
        q.required_ratio_min = q.required_ratio_min.clamp(0.0, 1.0);
        q.required_ratio_max = q.required_ratio_max.clamp(0.0, 1.0);
        if q.required_ratio_min > q.required_ratio_max {
            std::mem::swap(&mut q.required_ratio_min, &mut q.required_ratio_max);
        }
        if q.min_tags > q.max_tags {
            std::mem::swap(&mut q.min_tags, &mut q.max_tags);
        }

        let r = &mut self.resolution;
        r.max_concurrency = r.max_concurrency.max(1);
        if r.lookup_timeout_ms == 0 {
            r.lookup_timeout_ms = default_lookup_timeout_ms();
        }
        self
    }
}

/// Thresholds for the quality rule engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityConfig {
    #[serde(default = "default_min_packages")]
    pub min_packages: usize,
    /// Lower bound (inclusive) for the fraction of required packages.
    #[serde(default = "default_required_ratio_min")]
    pub required_ratio_min: f64,
    /// Upper bound (inclusive) for the fraction of required packages.
    #[serde(default = "default_required_ratio_max")]
    pub required_ratio_max: f64,
    #[serde(default = "default_min_tags")]
    pub min_tags: usize,
    #[serde(default = "default_max_tags")]
    pub max_tags: usize,
    #[serde(default = "default_min_description_chars")]
    pub min_description_chars: usize,
    /// Escalate selected warnings to errors for official collections.
    #[serde(default)]
    pub strict_official: bool,
    #[serde(default = "default_strict_escalations")]
    pub strict_escalations: Vec<FindingCode>,
}

fn default_min_packages() -> usize {
    3
}

fn default_required_ratio_min() -> f64 {
    0.3
}

fn default_required_ratio_max() -> f64 {
    0.8
}

fn default_min_tags() -> usize {
    3
}

fn default_max_tags() -> usize {
    7
}

fn default_min_description_chars() -> usize {
    40
}

fn default_strict_escalations() -> Vec<FindingCode> {
    vec![
        FindingCode::RequiredRatio,
        FindingCode::TagCardinality,
        FindingCode::MissingReason,
        FindingCode::DescriptionLength,
    ]
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            min_packages: default_min_packages(),
            required_ratio_min: default_required_ratio_min(),
            required_ratio_max: default_required_ratio_max(),
            min_tags: default_min_tags(),
            max_tags: default_max_tags(),
            min_description_chars: default_min_description_chars(),
            strict_official: false,
            strict_escalations: default_strict_escalations(),
        }
    }
}

/// Limits applied to registry lookups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionConfig {
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    #[serde(default = "default_lookup_timeout_ms")]
    pub lookup_timeout_ms: u64,
}

fn default_max_concurrency() -> usize {
    8
}

fn default_lookup_timeout_ms() -> u64 {
    5_000
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
            lookup_timeout_ms: default_lookup_timeout_ms(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validator_config_default_values() {
        let config = ValidatorConfig::default();
        assert_eq!(config.quality.min_packages, 3);
        assert!((config.quality.required_ratio_min - 0.3).abs() < f64::EPSILON);
        assert!((config.quality.required_ratio_max - 0.8).abs() < f64::EPSILON);
        assert_eq!(config.quality.min_tags, 3);
        assert_eq!(config.quality.max_tags, 7);
        assert!(!config.quality.strict_official);
        assert_eq!(config.resolution.max_concurrency, 8);
        assert_eq!(config.resolution.lookup_timeout_ms, 5_000);
    }

    #[test]
    fn test_validator_config_deserialize_empty() {
        let config: ValidatorConfig = toml::from_str("").unwrap();
        assert_eq!(config, ValidatorConfig::default());
    }

    #[test]
    fn test_validator_config_deserialize_partial() {
        let toml_str = r#"
[quality]
required_ratio_min = 0.5
required_ratio_max = 0.7
strict_official = true
strict_escalations = ["RequiredRatio"]

[resolution]
max_concurrency = 2
"#;
        let config: ValidatorConfig = toml::from_str(toml_str).unwrap();
        assert!((config.quality.required_ratio_min - 0.5).abs() < f64::EPSILON);
        assert!(config.quality.strict_official);
        assert_eq!(config.quality.strict_escalations, vec![FindingCode::RequiredRatio]);
        assert_eq!(config.quality.min_packages, 3);
        assert_eq!(config.resolution.max_concurrency, 2);
        assert_eq!(config.resolution.lookup_timeout_ms, 5_000);
    }

    #[test]
    fn test_sanitized_repairs_bounds() {
        let mut config = ValidatorConfig::default();
        config.quality.required_ratio_min = 0.9;
        config.quality.required_ratio_max = 0.2;
        config.quality.min_tags = 8;
        config.quality.max_tags = 2;
        config.resolution.max_concurrency = 0;
        config.resolution.lookup_timeout_ms = 0;

        let config = config.sanitized();
        assert!((config.quality.required_ratio_min - 0.2).abs() < f64::EPSILON);
        assert!((config.quality.required_ratio_max - 0.9).abs() < f64::EPSILON);
        assert_eq!((config.quality.min_tags, config.quality.max_tags), (2, 8));
        assert_eq!(config.resolution.max_concurrency, 1);
        assert_eq!(config.resolution.lookup_timeout_ms, 5_000);
    }

    #[test]
    fn test_sanitized_replaces_non_finite_ratios() {
        let toml_str = r#"
[quality]
required_ratio_min = nan
required_ratio_max = inf
"#;
        let config: ValidatorConfig = toml::from_str(toml_str).unwrap();
        assert!(config.quality.required_ratio_min.is_nan());

        let config = config.sanitized();
        assert!((config.quality.required_ratio_min - 0.3).abs() < f64::EPSILON);
        assert!((config.quality.required_ratio_max - 0.8).abs() < f64::EPSILON);
    }
}
