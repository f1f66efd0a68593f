//! Zipf's law analysis: a least-squares fit of `ln(value)` against `ln(rank)`.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::core::level::RiskLevel;
use crate::core::options::LawkitOptions;
use crate::core::result::{AnalysisResult, ZipfData};
use crate::error::{LawkitError, Result};
use crate::laws::{concat_chunks, AnalyzerState, Law, LawAnalyzer};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ZipfState {
    /// Strictly positive values, in input order
    pub values: Vec<f64>,
    pub excluded: u64,
}

impl AnalyzerState for ZipfState {
    fn merge(states: Vec<Self>) -> Result<Self> {
        let excluded = states.iter().map(|s| s.excluded).sum();
        let values = concat_chunks(states.into_iter().map(|s| s.values).collect());
        Ok(ZipfState { values, excluded })
    }
}

/// Ordinary least-squares line through `(x, y)` points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineFit {
    pub slope: f64,
    pub intercept: f64,
    /// Pearson correlation, 0 when either axis is constant
    pub correlation: f64,
    /// Root-mean-square residual
    pub rms_residual: f64,
}

impl LineFit {
    /// Fits a line; `None` with fewer than two points or a constant `x`.
    pub fn fit(xs: &[f64], ys: &[f64]) -> Option<Self> {
        let n = xs.len().min(ys.len());
        if n < 2 {
            return None;
        }
        let nf = n as f64;
        let (xs, ys) = (&xs[..n], &ys[..n]);

        if ys.iter().all(|&y| y == ys[0]) {
            if xs.iter().all(|&x| x == xs[0]) {
                return None;
            }
            return Some(Self {
                slope: 0.0,
                intercept: ys[0],
                correlation: 0.0,
                rms_residual: 0.0,
            });
        }

        let mean_x = xs.iter().sum::<f64>() / nf;
        let mean_y = ys.iter().sum::<f64>() / nf;

        let (mut sxx, mut sxy, mut syy) = (0.0, 0.0, 0.0);
        for (x, y) in xs.iter().zip(ys) {
            let dx = x - mean_x;
            let dy = y - mean_y;
            sxx += dx * dx;
            sxy += dx * dy;
            syy += dy * dy;
        }
        if sxx <= 0.0 {
            return None;
        }

        let slope = sxy / sxx;
        let intercept = mean_y - slope * mean_x;
        let correlation = if syy > 0.0 {
            (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0)
        } else {
            0.0
        };
        let residual_ss: f64 = xs
            .iter()
            .zip(ys)
            .map(|(x, y)| (y - (intercept + slope * x)).powi(2))
            .sum();

        Some(Self {
            slope,
            intercept,
            correlation,
            rms_residual: (residual_ss / nf).sqrt(),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct ZipfAnalyzer;

impl ZipfAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn from_options(_options: &LawkitOptions) -> Self {
        Self
    }

    fn classify(coefficient: f64, correlation: f64) -> RiskLevel {
        let deviation = (coefficient - 1.0).abs();
        if deviation <= 0.25 && correlation <= -0.9 {
            RiskLevel::Low
        } else if deviation > 0.75 || correlation > -0.7 {
            RiskLevel::High
        } else {
            RiskLevel::Medium
        }
    }
}

impl LawAnalyzer for ZipfAnalyzer {
    type State = ZipfState;

    fn law(&self) -> Law {
        Law::Zipf
    }

    fn compute_state(&self, chunk: &[f64]) -> Result<ZipfState> {
        let values: Vec<f64> = chunk.iter().copied().filter(|&v| v > 0.0).collect();
        let excluded = (chunk.len() - values.len()) as u64;
        Ok(ZipfState { values, excluded })
    }

    #[instrument(skip(self, state), fields(analyzer = "zipf"))]
    fn compute_result(&self, label: &str, state: ZipfState) -> Result<AnalysisResult> {
        let mut values = state.values;
        let total_items = values.len();
        if total_items < 2 {
            return Err(LawkitError::insufficient("zipf", 2, total_items));
        }
        if state.excluded > 0 {
            debug!(excluded = state.excluded, "Excluded non-positive values");
        }

        values.sort_by(|a, b| b.total_cmp(a));
        let log_ranks: Vec<f64> = (1..=total_items).map(|rank| (rank as f64).ln()).collect();
        let log_values: Vec<f64> = values.iter().map(|v| v.ln()).collect();

        let fit = LineFit::fit(&log_ranks, &log_values).ok_or_else(|| {
            LawkitError::Internal("rank axis is degenerate for two or more ranks".to_string())
        })?;

        // avoid reporting -0.0 for perfectly flat data
        let zipf_coefficient = if fit.slope == 0.0 { 0.0 } else { -fit.slope };
        let risk_level = Self::classify(zipf_coefficient, fit.correlation);

        let analysis_summary = format!(
            "Rank-size fit over {} items: exponent {:.3} (ideal 1.0), correlation {:.3}, RMS deviation {:.3}; risk {}",
            total_items, zipf_coefficient, fit.correlation, fit.rms_residual, risk_level
        );

        Ok(AnalysisResult::ZipfAnalysis(ZipfData {
            path: label.to_string(),
            zipf_coefficient,
            correlation_coefficient: fit.correlation,
            deviation_score: fit.rms_residual,
            intercept: fit.intercept,
            total_items,
            excluded_items: state.excluded as usize,
            risk_level,
            analysis_summary,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyze(values: &[f64]) -> Result<ZipfData> {
        match ZipfAnalyzer::new().analyze_values("default", values)? {
            AnalysisResult::ZipfAnalysis(data) => Ok(data),
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn test_exact_zipf() {
        let values: Vec<f64> = (1..=50).map(|r| 1000.0 / r as f64).collect();
        let data = analyze(&values).unwrap();
        assert!((data.zipf_coefficient - 1.0).abs() < 1e-9);
        assert!((data.correlation_coefficient + 1.0).abs() < 1e-9);
        assert!(data.deviation_score < 1e-9);
        assert!((data.intercept - 1000f64.ln()).abs() < 1e-9);
        assert_eq!(data.risk_level, RiskLevel::Low);
    }

    #[test]
    fn test_flat_data() {
        let data = analyze(&[5.0; 10]).unwrap();
        assert_eq!(data.zipf_coefficient, 0.0);
        assert_eq!(data.correlation_coefficient, 0.0);
        assert_eq!(data.risk_level, RiskLevel::High);
    }

    #[test]
    fn test_non_positive_values_are_excluded() {
        let data = analyze(&[0.0, -3.0, 100.0, 50.0, 33.3]).unwrap();
        assert_eq!(data.total_items, 3);
        assert_eq!(data.excluded_items, 2);

        assert!(matches!(
            analyze(&[0.0, -1.0, 4.0]),
            Err(LawkitError::InsufficientDataPoints { found: 1, .. })
        ));
    }

    #[test]
    fn test_steep_power_law_is_high_risk() {
        let values: Vec<f64> = (1..=30).map(|r| 1e6 / (r as f64).powi(3)).collect();
        let data = analyze(&values).unwrap();
        assert!((data.zipf_coefficient - 3.0).abs() < 1e-9);
        assert_eq!(data.risk_level, RiskLevel::High);
    }

    #[test]
    fn test_line_fit_rejects_degenerate_input() {
        assert!(LineFit::fit(&[1.0], &[2.0]).is_none());
        assert!(LineFit::fit(&[1.0, 1.0], &[2.0, 3.0]).is_none());
    }
}
