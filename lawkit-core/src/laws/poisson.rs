//! Poisson analysis for count data.
//!
//! Uses the index-of-dispersion test: for Poisson counts the statistic
//! `D = (n - 1) · s² / x̄` follows a chi-square distribution with `n - 1`
//! degrees of freedom. Both tails matter: overdispersion (clustering) and
//! underdispersion (suspiciously regular counts).

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::core::level::RiskLevel;
use crate::core::options::{LawkitOptions, RiskOptions};
use crate::core::result::{AnalysisResult, PoissonData};
use crate::error::{LawkitError, Result};
use crate::laws::{AnalyzerState, Law, LawAnalyzer};
use crate::stats::{chi_square_cdf, Moments};

/// Distance from an integer a count may have.
pub const INTEGER_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoissonState {
    pub moments: Moments,
    pub zeros: u64,
    pub max_count: u64,
}

impl AnalyzerState for PoissonState {
    fn merge(states: Vec<Self>) -> Result<Self> {
        Ok(states
            .into_iter()
            .fold(PoissonState::default(), |acc, s| PoissonState {
                moments: acc.moments.merge(&s.moments),
                zeros: acc.zeros + s.zeros,
                max_count: acc.max_count.max(s.max_count),
            }))
    }
}

/// Two-sided p-value of the dispersion statistic.
pub fn dispersion_p_value(statistic: f64, degrees_of_freedom: f64) -> f64 {
    let cdf = chi_square_cdf(statistic, degrees_of_freedom);
    (2.0 * cdf.min(1.0 - cdf)).clamp(0.0, 1.0)
}

#[derive(Debug, Clone)]
pub struct PoissonAnalyzer {
    risk: RiskOptions,
}

impl PoissonAnalyzer {
    pub fn new(risk: RiskOptions) -> Self {
        Self { risk }
    }

    pub fn from_options(options: &LawkitOptions) -> Self {
        Self::new(options.risk.clone())
    }

    fn classify(&self, p_value: f64, variance_ratio: f64) -> RiskLevel {
        if p_value < self.risk.strict_level() || variance_ratio >= 3.0 || variance_ratio <= 1.0 / 3.0
        {
            RiskLevel::High
        } else if p_value < self.risk.significance_level || (variance_ratio - 1.0).abs() > 0.5 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

impl LawAnalyzer for PoissonAnalyzer {
    type State = PoissonState;

    fn law(&self) -> Law {
        Law::Poisson
    }

    fn compute_state(&self, chunk: &[f64]) -> Result<PoissonState> {
        let mut state = PoissonState::default();
        for &value in chunk {
            let rounded = value.round();
            if value < 0.0 || (value - rounded).abs() > INTEGER_TOLERANCE {
                return Err(LawkitError::invalid_data(format!(
                    "Poisson analysis requires non-negative integer counts, found {value}"
                )));
            }
            state.moments.push(rounded);
            if rounded == 0.0 {
                state.zeros += 1;
            }
            state.max_count = state.max_count.max(rounded as u64);
        }
        Ok(state)
    }

    #[instrument(skip(self, state), fields(analyzer = "poisson"))]
    fn compute_result(&self, label: &str, state: PoissonState) -> Result<AnalysisResult> {
        let moments = state.moments;
        let total_observations = moments.count as usize;
        if total_observations < 3 {
            return Err(LawkitError::insufficient("poisson", 3, total_observations));
        }

        if moments.is_constant() {
            return Err(LawkitError::zero_variance("all counts are identical"));
        }
        let lambda = moments.mean();
        let Some(variance_ratio) = moments.variance_to_mean() else {
            return Err(LawkitError::zero_variance("mean count is zero"));
        };

        let n = moments.count as f64;
        let dispersion_statistic = (n - 1.0) * variance_ratio;
        let poisson_test_p = dispersion_p_value(dispersion_statistic, n - 1.0);
        let observed_zero_fraction = state.zeros as f64 / n;
        let expected_zero_fraction = (-lambda).exp();
        let risk_level = self.classify(poisson_test_p, variance_ratio);

        let dispersion = if variance_ratio > 1.0 {
            "overdispersed"
        } else {
            "underdispersed"
        };
        let analysis_summary = format!(
            "Mean rate {:.3} over {} observations; variance/mean {:.3} ({}), dispersion test p = {:.4}; zeros {:.1}% observed vs {:.1}% expected; risk {}",
            lambda,
            total_observations,
            variance_ratio,
            dispersion,
            poisson_test_p,
            observed_zero_fraction * 100.0,
            expected_zero_fraction * 100.0,
            risk_level
        );

        Ok(AnalysisResult::PoissonAnalysis(PoissonData {
            path: label.to_string(),
            lambda,
            variance_ratio,
            dispersion_statistic,
            poisson_test_p,
            observed_zero_fraction,
            expected_zero_fraction,
            max_count: state.max_count,
            total_observations,
            total_events: moments.sum().round() as u64,
            risk_level,
            analysis_summary,
        }))
    }
}
