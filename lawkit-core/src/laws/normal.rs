//! Normal distribution analysis.
//!
//! Moments are accumulated per chunk and merged; normality is judged with the
//! Jarque–Bera statistic, whose chi-square(2) survival function has the closed
//! form `exp(-JB / 2)`.

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::core::level::RiskLevel;
use crate::core::options::{LawkitOptions, RiskOptions};
use crate::core::result::{AnalysisResult, NormalData};
use crate::error::{LawkitError, Result};
use crate::laws::{concat_chunks, AnalyzerState, Law, LawAnalyzer};
use crate::stats::Moments;

/// |z| above which a value counts as an outlier.
pub const OUTLIER_Z: f64 = 3.0;

/// |skewness| from which data is never called normal.
pub const MAX_LOW_RISK_SKEW: f64 = 2.0;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalState {
    pub moments: Moments,
    /// Raw values, kept only when outlier counting is enabled
    pub retained: Vec<f64>,
}

impl AnalyzerState for NormalState {
    fn merge(states: Vec<Self>) -> Result<Self> {
        let moments = states
            .iter()
            .fold(Moments::default(), |acc, s| acc.merge(&s.moments));
        let retained = concat_chunks(states.into_iter().map(|s| s.retained).collect());
        Ok(NormalState { moments, retained })
    }
}

/// Jarque–Bera statistic and its asymptotic p-value.
pub fn jarque_bera(n: f64, skewness: f64, excess_kurtosis: f64) -> (f64, f64) {
    let statistic = n / 6.0 * (skewness.powi(2) + excess_kurtosis.powi(2) / 4.0);
    let p_value = (-statistic / 2.0).exp().clamp(0.0, 1.0);
    (statistic, p_value)
}

#[derive(Debug, Clone)]
pub struct NormalAnalyzer {
    risk: RiskOptions,
    outlier_detection: bool,
}

impl NormalAnalyzer {
    pub fn new(risk: RiskOptions, outlier_detection: bool) -> Self {
        Self {
            risk,
            outlier_detection,
        }
    }

    pub fn from_options(options: &LawkitOptions) -> Self {
        Self::new(
            options.risk.clone(),
            options.validation.enable_outlier_detection,
        )
    }

    fn classify(&self, p_value: f64, skewness: f64) -> RiskLevel {
        if p_value > self.risk.significance_level && skewness.abs() < MAX_LOW_RISK_SKEW {
            RiskLevel::Low
        } else if p_value < self.risk.strict_level() {
            RiskLevel::High
        } else {
            RiskLevel::Medium
        }
    }
}

impl LawAnalyzer for NormalAnalyzer {
    type State = NormalState;

    fn law(&self) -> Law {
        Law::Normal
    }

    fn compute_state(&self, chunk: &[f64]) -> Result<NormalState> {
        Ok(NormalState {
            moments: Moments::from_values(chunk),
            retained: if self.outlier_detection {
                chunk.to_vec()
            } else {
                Vec::new()
            },
        })
    }

    #[instrument(skip(self, state), fields(analyzer = "normal"))]
    fn compute_result(&self, label: &str, state: NormalState) -> Result<AnalysisResult> {
        let moments = state.moments;
        let total_numbers = moments.count as usize;
        if total_numbers < 3 {
            return Err(LawkitError::insufficient("normal", 3, total_numbers));
        }

        let mean = moments.mean();
        let std_dev = moments.sample_std_dev();
        if moments.is_constant() || !(std_dev > 0.0) {
            return Err(LawkitError::zero_variance(
                "normal analysis requires values that are not all equal",
            ));
        }

        let skewness = moments.skewness();
        let kurtosis = moments.excess_kurtosis();
        let (jarque_bera, normality_test_p) = jarque_bera(moments.count as f64, skewness, kurtosis);

        let outlier_count = state
            .retained
            .iter()
            .filter(|&&x| ((x - mean) / std_dev).abs() > OUTLIER_Z)
            .count();
        let risk_level = self.classify(normality_test_p, skewness);

        let mut analysis_summary = format!(
            "Mean {:.3}, std dev {:.3}, skewness {:.3}, excess kurtosis {:.3} over {} values; Jarque-Bera {:.2} (p = {:.4}); risk {}",
            mean, std_dev, skewness, kurtosis, total_numbers, jarque_bera, normality_test_p, risk_level
        );
        if self.outlier_detection && outlier_count > 0 {
            analysis_summary.push_str(&format!("; {outlier_count} values beyond 3 sigma"));
        }

        Ok(AnalysisResult::NormalAnalysis(NormalData {
            path: label.to_string(),
            mean,
            std_dev,
            skewness,
            kurtosis,
            jarque_bera,
            normality_test_p,
            min: moments.min,
            max: moments.max,
            outlier_count,
            total_numbers,
            risk_level,
            analysis_summary,
        }))
    }
}
