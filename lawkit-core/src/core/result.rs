//! Typed analysis results.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::core::level::RiskLevel;
use crate::laws::benford::{Conformity, DigitScheme};
use crate::laws::Law;

/// One entry of the engine's output sequence.
///
/// Serialized as `{"type": "<Variant>", "data": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum AnalysisResult {
    BenfordAnalysis(BenfordData),
    ParetoAnalysis(ParetoData),
    ZipfAnalysis(ZipfData),
    NormalAnalysis(NormalData),
    PoissonAnalysis(PoissonData),
    ValidationResult(ValidationData),
    DiagnosticResult(DiagnosticData),
    GeneratedData(GeneratedData),
    IntegrationAnalysis(IntegrationData),
}

impl AnalysisResult {
    /// Variant name as it appears in the `type` field.
    pub fn kind(&self) -> &'static str {
        match self {
            AnalysisResult::BenfordAnalysis(_) => "BenfordAnalysis",
            AnalysisResult::ParetoAnalysis(_) => "ParetoAnalysis",
            AnalysisResult::ZipfAnalysis(_) => "ZipfAnalysis",
            AnalysisResult::NormalAnalysis(_) => "NormalAnalysis",
            AnalysisResult::PoissonAnalysis(_) => "PoissonAnalysis",
            AnalysisResult::ValidationResult(_) => "ValidationResult",
            AnalysisResult::DiagnosticResult(_) => "DiagnosticResult",
            AnalysisResult::GeneratedData(_) => "GeneratedData",
            AnalysisResult::IntegrationAnalysis(_) => "IntegrationAnalysis",
        }
    }

    /// Label of the dataset the result describes.
    pub fn path(&self) -> &str {
        match self {
            AnalysisResult::BenfordAnalysis(d) => &d.path,
            AnalysisResult::ParetoAnalysis(d) => &d.path,
            AnalysisResult::ZipfAnalysis(d) => &d.path,
            AnalysisResult::NormalAnalysis(d) => &d.path,
            AnalysisResult::PoissonAnalysis(d) => &d.path,
            AnalysisResult::ValidationResult(d) => &d.path,
            AnalysisResult::DiagnosticResult(d) => &d.path,
            AnalysisResult::GeneratedData(d) => &d.path,
            AnalysisResult::IntegrationAnalysis(d) => &d.path,
        }
    }

    /// Risk level of law analyses; the overall risk for integrations.
    pub fn risk_level(&self) -> Option<RiskLevel> {
        match self {
            AnalysisResult::BenfordAnalysis(d) => Some(d.risk_level),
            AnalysisResult::ParetoAnalysis(d) => Some(d.risk_level),
            AnalysisResult::ZipfAnalysis(d) => Some(d.risk_level),
            AnalysisResult::NormalAnalysis(d) => Some(d.risk_level),
            AnalysisResult::PoissonAnalysis(d) => Some(d.risk_level),
            AnalysisResult::IntegrationAnalysis(d) => Some(d.overall_risk),
            AnalysisResult::ValidationResult(_)
            | AnalysisResult::DiagnosticResult(_)
            | AnalysisResult::GeneratedData(_) => None,
        }
    }

    /// The law a single-law analysis tested.
    pub fn law(&self) -> Option<Law> {
        match self {
            AnalysisResult::BenfordAnalysis(_) => Some(Law::Benford),
            AnalysisResult::ParetoAnalysis(_) => Some(Law::Pareto),
            AnalysisResult::ZipfAnalysis(_) => Some(Law::Zipf),
            AnalysisResult::NormalAnalysis(_) => Some(Law::Normal),
            AnalysisResult::PoissonAnalysis(_) => Some(Law::Poisson),
            _ => None,
        }
    }

    /// One-line summary; generated data has none of its own.
    pub fn analysis_summary(&self) -> Option<&str> {
        match self {
            AnalysisResult::BenfordAnalysis(d) => Some(&d.analysis_summary),
            AnalysisResult::ParetoAnalysis(d) => Some(&d.analysis_summary),
            AnalysisResult::ZipfAnalysis(d) => Some(&d.analysis_summary),
            AnalysisResult::NormalAnalysis(d) => Some(&d.analysis_summary),
            AnalysisResult::PoissonAnalysis(d) => Some(&d.analysis_summary),
            AnalysisResult::ValidationResult(d) => Some(&d.analysis_summary),
            AnalysisResult::DiagnosticResult(d) => Some(&d.analysis_summary),
            AnalysisResult::IntegrationAnalysis(d) => Some(&d.analysis_summary),
            AnalysisResult::GeneratedData(_) => None,
        }
    }
}

impl fmt::Display for AnalysisResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.analysis_summary() {
            Some(summary) => write!(f, "{} [{}]: {}", self.kind(), self.path(), summary),
            None => write!(f, "{} [{}]", self.kind(), self.path()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenfordData {
    pub path: String,
    pub digit_scheme: DigitScheme,
    pub base: u32,
    /// Observed digit proportions, one entry per bin
    pub observed_distribution: Vec<f64>,
    /// Expected digit proportions under Benford's law
    pub expected_distribution: Vec<f64>,
    pub observed_counts: Vec<u64>,
    pub chi_square: f64,
    pub degrees_of_freedom: usize,
    pub p_value: f64,
    /// Mean absolute deviation between observed and expected proportions
    pub mad: f64,
    pub conformity: Conformity,
    pub total_numbers: usize,
    pub risk_level: RiskLevel,
    pub analysis_summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParetoData {
    pub path: String,
    /// Share of the total (percent) held by the top slice
    pub top_20_percent_contribution: f64,
    /// Contribution relative to the 80% benchmark
    pub pareto_ratio: f64,
    /// Gini coefficient in [0, 1]
    pub concentration_index: f64,
    pub top_fraction: f64,
    pub top_item_count: usize,
    pub top_items: Vec<f64>,
    pub total_items: usize,
    pub total_value: f64,
    pub risk_level: RiskLevel,
    pub analysis_summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZipfData {
    pub path: String,
    pub zipf_coefficient: f64,
    pub correlation_coefficient: f64,
    /// RMS residual of the log-log fit
    pub deviation_score: f64,
    pub intercept: f64,
    pub total_items: usize,
    /// Non-positive values dropped before the log transform
    pub excluded_items: usize,
    pub risk_level: RiskLevel,
    pub analysis_summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalData {
    pub path: String,
    pub mean: f64,
    pub std_dev: f64,
    pub skewness: f64,
    /// Excess kurtosis
    pub kurtosis: f64,
    pub jarque_bera: f64,
    pub normality_test_p: f64,
    pub min: f64,
    pub max: f64,
    pub outlier_count: usize,
    pub total_numbers: usize,
    pub risk_level: RiskLevel,
    pub analysis_summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoissonData {
    pub path: String,
    pub lambda: f64,
    pub variance_ratio: f64,
    pub dispersion_statistic: f64,
    pub poisson_test_p: f64,
    pub observed_zero_fraction: f64,
    pub expected_zero_fraction: f64,
    pub max_count: u64,
    /// Number of observed intervals
    pub total_observations: usize,
    /// Sum of all counts
    pub total_events: u64,
    pub risk_level: RiskLevel,
    pub analysis_summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationData {
    pub path: String,
    pub validation_passed: bool,
    pub data_quality_score: f64,
    pub checks_passed: usize,
    pub checks_run: usize,
    pub issues_found: Vec<String>,
    pub total_numbers: usize,
    pub analysis_summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticData {
    pub path: String,
    pub diagnostic_type: String,
    pub findings: Vec<String>,
    pub outlier_indices: Vec<usize>,
    pub confidence_level: f64,
    pub total_numbers: usize,
    pub analysis_summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedData {
    pub path: String,
    pub data_type: Law,
    pub count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Resolved generator parameters, defaults included
    pub parameters: Map<String, Value>,
    pub sample_data: Vec<f64>,
}

/// A (dataset, law) pair the integrator could not evaluate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedAnalysis {
    pub path: String,
    pub law: Law,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrationData {
    pub path: String,
    pub laws_analyzed: Vec<Law>,
    pub datasets_analyzed: Vec<String>,
    pub overall_risk: RiskLevel,
    pub skipped: Vec<SkippedAnalysis>,
    pub conflicting_results: Vec<String>,
    pub recommendations: Vec<String>,
    pub analysis_summary: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn validation() -> AnalysisResult {
        AnalysisResult::ValidationResult(ValidationData {
            path: "default".to_string(),
            validation_passed: true,
            data_quality_score: 1.0,
            checks_passed: 5,
            checks_run: 5,
            issues_found: vec![],
            total_numbers: 12,
            analysis_summary: "All 5 data quality checks passed".to_string(),
        })
    }

    #[test]
    fn test_tagged_serialization() {
        let value = serde_json::to_value(validation()).unwrap();
        assert_eq!(value["type"], json!("ValidationResult"));
        assert_eq!(value["data"]["path"], json!("default"));
        assert_eq!(value["data"]["checks_run"], json!(5));
    }

    #[test]
    fn test_accessors() {
        let result = validation();
        assert_eq!(result.kind(), "ValidationResult");
        assert_eq!(result.path(), "default");
        assert_eq!(result.risk_level(), None);
        assert_eq!(result.law(), None);
        assert!(result.to_string().contains("All 5 data quality checks passed"));
    }

    #[test]
    fn test_generated_data_omits_missing_seed() {
        let result = AnalysisResult::GeneratedData(GeneratedData {
            path: "generated".to_string(),
            data_type: Law::Zipf,
            count: 2,
            seed: None,
            parameters: Map::new(),
            sample_data: vec![1000.0, 500.0],
        });
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["data"]["data_type"], json!("zipf"));
        assert!(value["data"].get("seed").is_none());
    }
}
