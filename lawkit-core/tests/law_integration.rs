//! End-to-end tests for the `law` entry point using realistic fixtures.

use lawkit_core::core::{AnalysisResult, RiskLevel};
use lawkit_core::laws::Law;
use lawkit_core::{law, LawkitError};
use serde_json::{json, Value};

fn financial_data() -> Value {
    json!({
        "financial_data": [
            123.45, 187.92, 234.67, 298.34, 345.78, 456.23, 567.89, 678.12, 789.56,
            1234.56, 1876.43, 2345.67, 2987.34, 3456.78, 4567.89, 5678.12, 6789.34, 7890.45,
            12345.67, 18765.43, 23456.78, 29876.54, 34567.89, 45678.12, 56789.34, 67890.45, 78901.23,
            123456.78, 187654.32, 234567.89, 298765.43, 345678.91, 456789.12, 567890.23, 678901.34
        ],
        "invoice_amounts": [
            101.50, 125.00, 198.75, 267.30, 334.20, 445.60, 523.80, 612.40, 785.90,
            1055.25, 1287.60, 1934.75, 2156.80, 3245.70, 4123.50, 5678.25, 6234.80, 7891.20,
            10234.50, 12876.30, 19847.60, 21568.90, 32457.80, 41235.60, 56782.40, 62348.70, 78912.30
        ]
    })
}

fn comprehensive_dataset() -> Value {
    json!({
        "comprehensive_dataset": {
            "financial_transactions": [
                123.45, 187.92, 234.67, 298.34, 345.78, 456.23, 567.89, 678.12, 789.56,
                1234.56, 1876.43, 2345.67, 2987.34, 3456.78, 4567.89, 5678.12, 6789.34, 7890.45
            ],
            "sales_amounts": [
                50000.0, 45000.0, 40000.0, 35000.0, 30000.0,
                2000.0, 1900.0, 1800.0, 1700.0, 1600.0, 1500.0, 1400.0, 1300.0,
                1200.0, 1100.0, 1000.0, 900.0, 800.0, 700.0, 600.0
            ],
            "quality_scores": [
                98.5, 99.2, 100.1, 99.8, 100.4, 99.6, 100.8, 99.9, 100.2, 99.7,
                100.3, 99.4, 100.6, 99.1, 100.9, 99.3, 100.5, 99.0, 101.0, 99.8
            ],
            "incident_counts": [0, 1, 2, 1, 3, 0, 2, 1, 4, 2, 1, 0, 3, 2, 1, 5, 0, 2, 1, 3]
        }
    })
}

fn low_or_medium(level: Option<RiskLevel>) -> bool {
    matches!(level, Some(RiskLevel::Low | RiskLevel::Medium))
}

fn medium_or_high(level: Option<RiskLevel>) -> bool {
    matches!(level, Some(RiskLevel::Medium | RiskLevel::High))
}

#[tokio::test]
async fn test_benford_on_financial_amounts() {
    let results = law("benford", &financial_data(), &json!({})).await.unwrap();
    assert_eq!(results.len(), 1);

    let AnalysisResult::BenfordAnalysis(data) = &results[0] else {
        panic!("expected a Benford analysis, got {}", results[0].kind());
    };
    assert_eq!(data.path, "combined");
    assert_eq!(data.total_numbers, 62);
    assert_eq!(data.observed_distribution.len(), 9);
    assert_eq!(data.expected_distribution.len(), 9);
    assert!((0.0..=1.0).contains(&data.p_value));
    assert!((data.observed_distribution.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    assert!(low_or_medium(results[0].risk_level()));
}

#[tokio::test]
async fn test_benford_flags_clustered_amounts() {
    let uniform: Vec<f64> = (0..30).map(|i| 500.0 + f64::from(i)).collect();
    let suspicious: Vec<f64> = [7000.0, 8000.0, 9000.0]
        .iter()
        .flat_map(|base| (0..10).map(move |i| base + f64::from(i)))
        .collect();
    let data = json!({"uniform_data": uniform, "suspicious_data": suspicious});

    let results = law("benford", &data, &json!(null)).await.unwrap();
    assert!(medium_or_high(results[0].risk_level()));
}

#[tokio::test]
async fn test_pareto_concentration() {
    let data = json!({
        "sales_data": [
            10000.0, 9500.0, 9000.0, 8500.0, 1000.0, 950.0, 900.0, 850.0, 800.0, 750.0,
            700.0, 650.0, 600.0, 550.0, 500.0, 450.0, 400.0, 350.0, 300.0, 250.0
        ]
    });
    let results = law("pareto", &data, &json!({})).await.unwrap();
    let AnalysisResult::ParetoAnalysis(pareto) = &results[0] else {
        panic!("expected a Pareto analysis");
    };
    assert_eq!(pareto.path, "sales_data");
    assert!(
        pareto.top_20_percent_contribution > 60.0,
        "contribution {}",
        pareto.top_20_percent_contribution
    );
    assert!(pareto.concentration_index > 0.0);
    assert_eq!(pareto.top_item_count, 4);

    let even: Vec<f64> = (0..20).map(|i| 1000.0 + 10.0 * f64::from(i)).collect();
    let results = law("pareto", &json!(even), &json!({})).await.unwrap();
    let AnalysisResult::ParetoAnalysis(pareto) = &results[0] else {
        panic!("expected a Pareto analysis");
    };
    assert!(pareto.top_20_percent_contribution < 60.0);
    assert_eq!(pareto.risk_level, RiskLevel::High);
}

#[tokio::test]
async fn test_pareto_few_large_many_small() {
    let mut values = vec![1000.0, 950.0, 900.0, 850.0];
    values.extend((1..=16).map(|i| 10.0 * f64::from(i)));

    let results = law("pareto", &json!(values), &json!({})).await.unwrap();
    let AnalysisResult::ParetoAnalysis(pareto) = &results[0] else {
        panic!("expected a Pareto analysis");
    };
    assert!(pareto.top_20_percent_contribution > 60.0);
    assert!(pareto.top_20_percent_contribution <= 100.0);
}

#[tokio::test]
async fn test_zipf_word_frequencies() {
    let frequencies: Vec<f64> = (1..=20).map(|rank| 10000.0 / f64::from(rank)).collect();
    let results = law("zipf", &json!({"word_frequencies": frequencies}), &json!({}))
        .await
        .unwrap();
    let AnalysisResult::ZipfAnalysis(zipf) = &results[0] else {
        panic!("expected a Zipf analysis");
    };
    assert!((zipf.zipf_coefficient - 1.0).abs() < 1e-6);
    assert!(zipf.correlation_coefficient < -0.99);
    assert_eq!(zipf.risk_level, RiskLevel::Low);
}

#[tokio::test]
async fn test_normal_sample_and_skewed_sample() {
    let sample = json!([
        98.5, 99.2, 100.1, 99.8, 100.4, 99.6, 100.8, 99.9, 100.2, 99.7,
        100.3, 99.4, 100.6, 99.1, 100.9, 99.3, 100.5, 99.0, 101.0, 99.8,
        100.0, 99.5, 100.7, 99.2, 100.3, 99.6, 100.1, 99.9, 100.4, 99.7
    ]);
    let results = law("normal", &sample, &json!({})).await.unwrap();
    let AnalysisResult::NormalAnalysis(normal) = &results[0] else {
        panic!("expected a Normal analysis");
    };
    assert!((normal.mean - 99.94).abs() < 0.1);
    assert!(normal.skewness.abs() < 2.0);
    assert!((0.0..=1.0).contains(&normal.normality_test_p));
    assert!(low_or_medium(results[0].risk_level()));

    let skewed = json!([
        1.0, 1.1, 1.2, 1.3, 1.5, 1.8, 2.2, 2.8, 3.6, 4.7,
        6.1, 8.0, 10.4, 13.5, 17.6, 22.9, 29.8, 38.7, 50.3, 65.4,
        85.0, 110.5, 143.7, 186.8, 242.8, 315.6, 410.3, 533.4, 693.4, 901.4
    ]);
    let results = law("normal", &skewed, &json!({})).await.unwrap();
    assert!(medium_or_high(results[0].risk_level()));
}

#[tokio::test]
async fn test_poisson_event_counts() {
    let counts = json!([
        0, 1, 2, 1, 3, 0, 2, 1, 4, 2, 1, 0, 3, 2, 1, 5, 0, 2, 1, 3,
        2, 1, 0, 4, 2, 1, 3, 0, 2, 1, 2, 3, 1, 0, 2, 1, 4, 2, 0, 3
    ]);
    let results = law("poisson", &counts, &json!({})).await.unwrap();
    let AnalysisResult::PoissonAnalysis(poisson) = &results[0] else {
        panic!("expected a Poisson analysis");
    };
    assert!((poisson.lambda - 1.7).abs() < 1e-9);
    assert_eq!(poisson.total_observations, 40);
    assert_eq!(poisson.total_events, 68);
    assert!(low_or_medium(results[0].risk_level()));

    let bursty = json!([
        0, 0, 0, 0, 0, 50, 50, 50, 50, 50, 0, 0, 0, 0, 0,
        100, 100, 100, 100, 100, 0, 0, 0, 0, 0, 25, 25, 25, 25, 25
    ]);
    let results = law("poisson", &bursty, &json!({})).await.unwrap();
    assert!(medium_or_high(results[0].risk_level()));
}

#[tokio::test]
async fn test_validate_and_diagnose() {
    let results = law("validate", &json!([1.0, 2.0, 3.0]), &json!({}))
        .await
        .unwrap();
    let AnalysisResult::ValidationResult(validation) = &results[0] else {
        panic!("expected a validation result");
    };
    assert!(!validation.validation_passed);
    assert!(!validation.issues_found.is_empty());
    assert!(validation.data_quality_score < 1.0);

    let mut readings = vec![
        98.5, 99.2, 100.1, 99.8, 100.4, 99.6, 100.8, 99.9, 100.2, 99.7,
        100.3, 99.4, 100.6, 99.1, 100.9, 99.3, 100.5, 99.0, 101.0, 99.8,
    ];
    readings.push(150.0);
    readings.extend([100.0, 99.5, 100.7, 99.2, 100.3, 99.6, 100.1, 99.9, 100.4, 99.7]);
    readings.push(50.0);

    let results = law("diagnose", &json!(readings), &json!({})).await.unwrap();
    let AnalysisResult::DiagnosticResult(diagnostic) = &results[0] else {
        panic!("expected a diagnostic result");
    };
    assert_eq!(diagnostic.diagnostic_type, "General");
    assert!(!diagnostic.findings.is_empty());
    assert!(diagnostic.outlier_indices.contains(&20));
    assert!(diagnostic.outlier_indices.contains(&31));
    assert!(diagnostic.confidence_level > 0.0 && diagnostic.confidence_level <= 1.0);
}

#[tokio::test]
async fn test_generate_benford() {
    let results = law(
        "generate",
        &json!({"type": "benford", "count": 1000, "base": 10}),
        &json!({}),
    )
    .await
    .unwrap();
    assert_eq!(results.len(), 1);

    let AnalysisResult::GeneratedData(generated) = &results[0] else {
        panic!("expected generated data");
    };
    assert_eq!(generated.data_type, Law::Benford);
    assert_eq!(generated.count, 1000);
    assert_eq!(generated.sample_data.len(), 1000);
    assert!(!generated.parameters.is_empty());

    let json = serde_json::to_value(&results[0]).unwrap();
    assert_eq!(json["data"]["data_type"], "benford");
}

#[tokio::test]
async fn test_generated_benford_data_conforms() {
    for count in [100, 1000] {
        let results = law(
            "generate",
            &json!({"type": "benford", "count": count, "seed": 42}),
            &json!({}),
        )
        .await
        .unwrap();
        let AnalysisResult::GeneratedData(generated) = &results[0] else {
            panic!("expected generated data");
        };

        let analysis = law("benford", &json!(generated.sample_data), &json!({}))
            .await
            .unwrap();
        let AnalysisResult::BenfordAnalysis(benford) = &analysis[0] else {
            panic!("expected a Benford analysis");
        };
        assert_eq!(benford.total_numbers, count);
        assert!(low_or_medium(analysis[0].risk_level()), "count {count}");
    }
}

#[tokio::test]
async fn test_analyze_comprehensive_dataset() {
    let options = json!({"show_details": true, "show_recommendations": true});
    let results = law("analyze", &comprehensive_dataset(), &options)
        .await
        .unwrap();
    assert!(results.len() > 1);

    let Some(AnalysisResult::IntegrationAnalysis(integration)) = results.last() else {
        panic!("the last result must be the integration analysis");
    };
    assert!(!integration.laws_analyzed.is_empty());
    assert!(!integration.recommendations.is_empty());
    assert_eq!(integration.datasets_analyzed.len(), 4);
    assert!(integration
        .datasets_analyzed
        .iter()
        .all(|label| label.starts_with("comprehensive_dataset.")));

    let kinds: std::collections::BTreeSet<&str> = results.iter().map(|r| r.kind()).collect();
    assert!(kinds.len() >= 3);

    // Non-integer amounts cannot be Poisson counts.
    assert!(integration.skipped.iter().any(|skipped| skipped.law == Law::Poisson
        && skipped.path == "comprehensive_dataset.financial_transactions"));

    let worst = results[..results.len() - 1]
        .iter()
        .filter_map(AnalysisResult::risk_level)
        .max()
        .unwrap();
    assert_eq!(integration.overall_risk, worst);
}

#[tokio::test]
async fn test_analyze_restricted_laws() {
    let data = json!({
        "north": [12, 7, 3, 25, 9, 14, 31, 5, 18, 2],
        "south": [120, 75, 33, 250, 91, 140, 310, 58, 180, 27],
        "east": [1, 0, 2, 1, 3, 0, 1, 2, 1, 0],
        "west": [4, 6, 3, 5, 7, 2, 4, 5, 6, 3]
    });
    let options = json!({"laws_to_check": ["benford", "poisson"]});
    let results = law("analyze", &data, &options).await.unwrap();

    let integrations: Vec<&AnalysisResult> = results
        .iter()
        .filter(|r| matches!(r, AnalysisResult::IntegrationAnalysis(_)))
        .collect();
    assert_eq!(integrations.len(), 1);
    assert!(matches!(
        results.last(),
        Some(AnalysisResult::IntegrationAnalysis(_))
    ));

    for result in &results[..results.len() - 1] {
        assert!(matches!(result.law(), Some(Law::Benford | Law::Poisson)));
    }
    let AnalysisResult::IntegrationAnalysis(integration) = &results[results.len() - 1] else {
        unreachable!();
    };
    assert!(integration
        .laws_analyzed
        .iter()
        .all(|law| matches!(law, Law::Benford | Law::Poisson)));
}

#[tokio::test]
async fn test_results_are_reproducible() {
    let data = comprehensive_dataset();
    let sequential = json!({"batch_size": 3});
    let parallel = json!({"batch_size": 3, "enable_parallel_processing": true});

    let first = law("analyze", &data, &sequential).await.unwrap();
    let second = law("analyze", &data, &sequential).await.unwrap();
    let threaded = law("analyze", &data, &parallel).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first, threaded);
}

#[tokio::test]
async fn test_error_cases() {
    let err = law("benford", &json!([]), &json!({})).await.unwrap_err();
    assert!(matches!(err, LawkitError::NoValidNumbers));
    assert_eq!(err.to_string(), "No valid numbers found");

    let err = law("benford", &json!({"not": "numbers"}), &json!({}))
        .await
        .unwrap_err();
    assert!(matches!(err, LawkitError::NoValidNumbers));

    let err = law("normal", &json!([1.0, 2.0]), &json!({})).await.unwrap_err();
    assert!(err.to_string().contains("Insufficient data points"));

    let err = law("normal", &json!([1, 1, 1, 1, 1]), &json!({}))
        .await
        .unwrap_err();
    assert!(matches!(err, LawkitError::ZeroVariance(_)));

    let err = law("invalid_subcommand", &json!([1, 2, 3]), &json!({}))
        .await
        .unwrap_err();
    assert!(matches!(err, LawkitError::UnknownSubcommand(_)));
}
