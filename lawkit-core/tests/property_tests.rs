//! Property-based tests for the lawkit engine.
//!
//! These tests use proptest to check invariants that must hold for every
//! input, not just the hand-picked fixtures of the integration suite.
//!
//! ## Test Categories
//!
//! ### 1. Statistics
//! - Chi-square tail probabilities stay in `[0, 1]` and are monotone
//! - The chi-square median stays near its degrees of freedom up to 10^7
//!
//! ### 2. Law Metrics
//! - Benford p-values are probabilities and observed proportions sum to 1
//! - Pareto contributions are percentages
//! - Zipf correlations are in `[-1, 1]`
//! - Magnitudes near the top of the f64 range keep every metric finite
//!
//! ### 3. Input Normalization
//! - Arbitrary JSON never yields a non-finite value
//!
//! ### 4. Risk Aggregation
//! - Aggregated levels stay between the least and most severe input
//!
//! ### 5. Execution
//! - Chunk size and parallelism never change a result
//!
//! ## Running
//!
//! ```bash
//! PROPTEST_CASES=1000 cargo test --test property_tests
//! ```

use lawkit_core::core::{AnalysisResult, InputOptions, LawkitOptions, RiskAggregation, RiskLevel};
use lawkit_core::input::{normalize, NumericDataset};
use lawkit_core::laws::{analyze_law, Law};
use lawkit_core::stats::special::{chi_square_cdf, chi_square_sf};
use lawkit_core::LawkitError;
use proptest::prelude::*;
use serde_json::Value;

// ============================================================================
// Strategies
// ============================================================================

fn json_leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<f64>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        "[0-9.,eE+-]{0,12}".prop_map(Value::from),
        ".{0,8}".prop_map(Value::from),
    ]
}

fn json_payload() -> impl Strategy<Value = Value> {
    json_leaf().prop_recursive(3, 64, 8, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..8).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,4}", inner, 0..5)
                .prop_map(|map| Value::Object(map.into_iter().collect())),
        ]
    })
}

fn risk_level() -> impl Strategy<Value = RiskLevel> {
    prop_oneof![
        Just(RiskLevel::Low),
        Just(RiskLevel::Medium),
        Just(RiskLevel::High)
    ]
}

fn run_law(law: Law, values: Vec<f64>, options: &LawkitOptions) -> lawkit_core::Result<AnalysisResult> {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let dataset = NumericDataset::new("values", values);
    rt.block_on(analyze_law(law, &dataset, options))
}

// ============================================================================
// Statistics
// ============================================================================

proptest! {
    #[test]
    fn test_chi_square_tail_is_probability(
        statistic in 0.0f64..500.0,
        degrees in 1u32..100
    ) {
        let p = chi_square_sf(statistic, f64::from(degrees));
        prop_assert!((0.0..=1.0).contains(&p), "p = {}", p);

        let further = chi_square_sf(statistic + 1.0, f64::from(degrees));
        prop_assert!(further <= p + 1e-12);
    }

    #[test]
    fn test_chi_square_median_for_large_degrees(degrees in 1e3f64..1e7) {
        let cdf = chi_square_cdf(degrees, degrees);
        prop_assert!((cdf - 0.5).abs() < 0.02, "cdf({0}, {0}) = {1}", degrees, cdf);
    }
}

// ============================================================================
// Law Metrics
// ============================================================================

proptest! {
    #[test]
    fn test_benford_metrics_are_probabilities(
        values in prop::collection::vec(1.0f64..1e9, 5..300)
    ) {
        let result = run_law(Law::Benford, values.clone(), &LawkitOptions::default()).unwrap();
        let AnalysisResult::BenfordAnalysis(data) = result else {
            panic!("expected a Benford analysis");
        };

        prop_assert!((0.0..=1.0).contains(&data.p_value));
        prop_assert!(data.chi_square >= 0.0);
        prop_assert_eq!(data.total_numbers, values.len());
        prop_assert_eq!(data.observed_counts.iter().sum::<u64>(), values.len() as u64);
        let total: f64 = data.observed_distribution.iter().sum();
        prop_assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_pareto_contribution_is_percentage(
        values in prop::collection::vec(0.1f64..1e6, 1..200)
    ) {
        let result = run_law(Law::Pareto, values, &LawkitOptions::default()).unwrap();
        let AnalysisResult::ParetoAnalysis(data) = result else {
            panic!("expected a Pareto analysis");
        };

        prop_assert!((0.0..=100.0).contains(&data.top_20_percent_contribution));
        // The top fifth holds at least a fifth of the total.
        prop_assert!(data.top_20_percent_contribution + 1e-9 >= data.top_fraction * 100.0);
        prop_assert!((0.0..=1.0).contains(&data.concentration_index));
    }

    #[test]
    fn test_zipf_correlation_is_bounded(
        values in prop::collection::vec(1.0f64..1e6, 5..60)
    ) {
        match run_law(Law::Zipf, values, &LawkitOptions::default()) {
            Ok(AnalysisResult::ZipfAnalysis(data)) => {
                prop_assert!((-1.0..=1.0).contains(&data.correlation_coefficient));
                prop_assert!(data.zipf_coefficient.is_finite());
            }
            Ok(other) => panic!("expected a Zipf analysis, got {}", other.kind()),
            Err(e) => prop_assert!(e.is_skippable(), "unexpected error {}", e),
        }
    }

    #[test]
    fn test_normal_p_value_is_probability(
        values in prop::collection::vec(-1e4f64..1e4, 8..200)
    ) {
        match run_law(Law::Normal, values, &LawkitOptions::default()) {
            Ok(AnalysisResult::NormalAnalysis(data)) => {
                prop_assert!((0.0..=1.0).contains(&data.normality_test_p));
                prop_assert!(data.std_dev > 0.0);
                prop_assert!(data.min <= data.mean && data.mean <= data.max);
            }
            Ok(other) => panic!("expected a Normal analysis, got {}", other.kind()),
            Err(e) => prop_assert!(matches!(e, LawkitError::ZeroVariance(_))),
        }
    }
}

proptest! {
    #[test]
    fn test_pareto_shares_ignore_magnitude(
        values in prop::collection::vec(1.0f64..1e6, 2..100)
    ) {
        let huge: Vec<f64> = values.iter().map(|v| v * 1e302).collect();
        let base = run_law(Law::Pareto, values, &LawkitOptions::default()).unwrap();
        let scaled = run_law(Law::Pareto, huge, &LawkitOptions::default()).unwrap();
        let (AnalysisResult::ParetoAnalysis(base), AnalysisResult::ParetoAnalysis(scaled)) =
            (base, scaled)
        else {
            panic!("expected Pareto analyses");
        };

        prop_assert!(scaled.total_value.is_finite());
        prop_assert!((scaled.top_20_percent_contribution - base.top_20_percent_contribution).abs() < 1e-6);
        prop_assert!((scaled.concentration_index - base.concentration_index).abs() < 1e-6);
    }

    #[test]
    fn test_normal_metrics_finite_for_huge_values(
        values in prop::collection::vec(-1.0f64..1.0, 8..100)
    ) {
        let huge: Vec<f64> = values.iter().map(|v| v * 1e307).collect();
        match run_law(Law::Normal, huge, &LawkitOptions::default()) {
            Ok(AnalysisResult::NormalAnalysis(data)) => {
                prop_assert!(data.mean.is_finite());
                prop_assert!(data.std_dev.is_finite() && data.std_dev > 0.0);
                prop_assert!(data.skewness.is_finite() && data.kurtosis.is_finite());
                prop_assert!((0.0..=1.0).contains(&data.normality_test_p));
            }
            Ok(other) => panic!("expected a Normal analysis, got {}", other.kind()),
            Err(e) => prop_assert!(matches!(e, LawkitError::ZeroVariance(_))),
        }
    }

    #[test]
    fn test_poisson_accepts_huge_counts(
        counts in prop::collection::vec(0u32..20, 3..60),
        huge in 1e200f64..1e305
    ) {
        let mut values: Vec<f64> = counts.into_iter().map(f64::from).collect();
        values.push(huge.round());
        let result = run_law(Law::Poisson, values, &LawkitOptions::default()).unwrap();
        let AnalysisResult::PoissonAnalysis(data) = result else {
            panic!("expected a Poisson analysis");
        };
        prop_assert!(data.lambda.is_finite() && data.lambda > 0.0);
        prop_assert!(data.variance_ratio.is_finite() && data.variance_ratio > 3.0);
        prop_assert!((0.0..=1.0).contains(&data.poisson_test_p));
        prop_assert_eq!(data.risk_level, RiskLevel::High);
    }
}

// ============================================================================
// Input Normalization
// ============================================================================

proptest! {
    #[test]
    fn test_normalized_values_are_finite(
        payload in json_payload(),
        international in any::<bool>()
    ) {
        let options = InputOptions {
            international_numerals: international,
            ..InputOptions::default()
        };
        match normalize(&payload, &options) {
            Ok(datasets) => {
                prop_assert!(!datasets.is_empty());
                for dataset in &datasets {
                    prop_assert!(!dataset.is_empty());
                    prop_assert!(dataset.values.iter().all(|v| v.is_finite()));
                }
            }
            Err(e) => prop_assert!(matches!(e, LawkitError::NoValidNumbers)),
        }
    }
}

// ============================================================================
// Risk Aggregation
// ============================================================================

proptest! {
    #[test]
    fn test_aggregated_risk_is_bounded(
        levels in prop::collection::vec(risk_level(), 1..20)
    ) {
        let lowest = *levels.iter().min().unwrap();
        let highest = *levels.iter().max().unwrap();

        let max = RiskAggregation::Max.combine(levels.iter().copied()).unwrap();
        prop_assert_eq!(max, highest);

        let average = RiskAggregation::Average.combine(levels.iter().copied()).unwrap();
        prop_assert!(lowest <= average && average <= highest);
    }
}

// ============================================================================
// Execution
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_chunking_never_changes_results(
        values in prop::collection::vec(1.0f64..1e6, 5..400),
        chunk_size in 1usize..64,
        parallel in any::<bool>()
    ) {
        let whole = LawkitOptions::default();
        let chunked = LawkitOptions::default()
            .with_chunk_size(chunk_size)
            .unwrap()
            .with_parallel_processing(parallel);

        for law in [Law::Benford, Law::Pareto] {
            let expected = run_law(law, values.clone(), &whole).unwrap();
            let actual = run_law(law, values.clone(), &chunked).unwrap();
            prop_assert_eq!(expected, actual);
        }
    }
}
