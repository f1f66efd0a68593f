//! Composite data-quality validation.
//!
//! Runs a fixed set of weighted checks. Failed checks are reported as issues,
//! never as errors.

use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, instrument};

use crate::core::options::{LawkitOptions, ValidationOptions};
use crate::core::result::ValidationData;
use crate::input::NumericDataset;

/// Score a dataset must exceed to pass validation.
pub const PASS_THRESHOLD: f64 = 0.7;

/// Largest share of values that may repeat an earlier value.
pub const MAX_DUPLICATE_RATIO: f64 = 0.5;

/// Magnitude from which doubles stop representing integers exactly.
pub const MAX_MAGNITUDE: f64 = 1e15;

/// Outcome of one weighted check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityCheck {
    pub name: &'static str,
    pub weight: f64,
    pub passed: bool,
    /// Why the check failed; empty when it passed
    pub detail: String,
}

impl QualityCheck {
    fn new(name: &'static str, weight: f64, passed: bool, detail: impl Into<String>) -> Self {
        Self {
            name,
            weight,
            passed,
            detail: if passed { String::new() } else { detail.into() },
        }
    }
}

#[derive(Debug, Clone)]
pub struct Validator {
    options: ValidationOptions,
}

impl Validator {
    pub fn new(options: ValidationOptions) -> Self {
        Self { options }
    }

    pub fn from_options(options: &LawkitOptions) -> Self {
        Self::new(options.validation.clone())
    }

    /// Evaluates every check in a fixed order.
    pub fn checks(&self, values: &[f64]) -> Vec<QualityCheck> {
        let n = values.len();
        let min_sample_size = self.options.min_sample_size;

        let mut seen = HashSet::with_capacity(n);
        let duplicates = values
            .iter()
            .filter(|&&v| !seen.insert(canonical_bits(v)))
            .count();
        let duplicate_ratio = if n == 0 {
            0.0
        } else {
            duplicates as f64 / n as f64
        };

        let non_positive = values.iter().filter(|&&v| v <= 0.0).count();
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let oversized = values.iter().filter(|v| v.abs() >= MAX_MAGNITUDE).count();

        vec![
            QualityCheck::new(
                "sample_size",
                0.35,
                n >= min_sample_size,
                format!("{n} values, at least {min_sample_size} required"),
            ),
            QualityCheck::new(
                "duplicate_ratio",
                0.20,
                duplicate_ratio <= MAX_DUPLICATE_RATIO,
                format!(
                    "{:.1}% of values repeat an earlier value",
                    duplicate_ratio * 100.0
                ),
            ),
            QualityCheck::new(
                "non_positive_values",
                0.15,
                non_positive == 0,
                format!("{non_positive} values are zero or negative"),
            ),
            QualityCheck::new(
                "value_range",
                0.15,
                n > 0 && max > min,
                "all values are identical",
            ),
            QualityCheck::new(
                "magnitude",
                0.15,
                oversized == 0,
                format!("{oversized} values exceed {MAX_MAGNITUDE:e} in magnitude"),
            ),
        ]
    }

    #[instrument(skip(self, dataset), fields(dataset = %dataset.label, values = dataset.len()))]
    pub fn validate(&self, dataset: &NumericDataset) -> ValidationData {
        let checks = self.checks(&dataset.values);
        let score: f64 = checks.iter().filter(|c| c.passed).map(|c| c.weight).sum();
        let data_quality_score = score.clamp(0.0, 1.0);
        let validation_passed = data_quality_score > PASS_THRESHOLD;
        let checks_passed = checks.iter().filter(|c| c.passed).count();
        let issues_found: Vec<String> = checks
            .iter()
            .filter(|c| !c.passed)
            .map(|c| format!("{}: {}", c.name, c.detail))
            .collect();

        debug!(
            score = data_quality_score,
            passed = validation_passed,
            issues = issues_found.len(),
            "Validation complete"
        );

        let analysis_summary = if issues_found.is_empty() {
            format!(
                "All {} data quality checks passed for {} values (score {:.2})",
                checks.len(),
                dataset.len(),
                data_quality_score
            )
        } else {
            format!(
                "{} of {} data quality checks passed for {} values (score {:.2}); validation {}",
                checks_passed,
                checks.len(),
                dataset.len(),
                data_quality_score,
                if validation_passed { "passed" } else { "failed" }
            )
        };

        ValidationData {
            path: dataset.label.clone(),
            validation_passed,
            data_quality_score,
            checks_passed,
            checks_run: checks.len(),
            issues_found,
            total_numbers: dataset.len(),
            analysis_summary,
        }
    }
}

// Treats 0.0 and -0.0 as the same value.
fn canonical_bits(value: f64) -> u64 {
    if value == 0.0 {
        0
    } else {
        value.to_bits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validate(values: &[f64]) -> ValidationData {
        Validator::from_options(&LawkitOptions::default())
            .validate(&NumericDataset::new("default", values.to_vec()))
    }

    #[test]
    fn test_clean_data_passes() {
        let values: Vec<f64> = (1..=20).map(|i| i as f64 * 11.3).collect();
        let data = validate(&values);
        assert!(data.validation_passed);
        assert!((data.data_quality_score - 1.0).abs() < 1e-12);
        assert_eq!(data.checks_passed, 5);
        assert_eq!(data.checks_run, 5);
        assert!(data.issues_found.is_empty());
    }

    #[test]
    fn test_small_sample_fails() {
        let data = validate(&[1.0, 2.0, 3.0]);
        assert!(!data.validation_passed);
        assert!((data.data_quality_score - 0.65).abs() < 1e-9);
        assert_eq!(data.issues_found.len(), 1);
        assert!(data.issues_found[0].starts_with("sample_size"));
    }

    #[test]
    fn test_degenerate_data_reports_every_issue() {
        let data = validate(&[0.0; 12]);
        assert!(!data.validation_passed);
        let names: Vec<&str> = data
            .issues_found
            .iter()
            .map(|issue| issue.split(':').next().unwrap_or_default())
            .collect();
        assert_eq!(names, vec!["duplicate_ratio", "non_positive_values", "value_range"]);
    }

    #[test]
    fn test_magnitude_check() {
        let mut values: Vec<f64> = (1..=12).map(f64::from).collect();
        values.push(2e15);
        let checks = Validator::from_options(&LawkitOptions::default()).checks(&values);
        let magnitude = checks.iter().find(|c| c.name == "magnitude").unwrap();
        assert!(!magnitude.passed);
        assert!(magnitude.detail.contains("1 values"));
    }
}
