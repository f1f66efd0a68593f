//! Pareto principle analysis.
//!
//! Measures how much of the total the top slice of items holds and how
//! unequal the whole distribution is (Gini coefficient).

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::core::level::RiskLevel;
use crate::core::options::{LawkitOptions, ParetoOptions};
use crate::core::result::{AnalysisResult, ParetoData};
use crate::error::{LawkitError, Result};
use crate::laws::{concat_chunks, AnalyzerState, Law, LawAnalyzer};

/// Share of the total the top 20% should hold under the 80/20 rule.
pub const PARETO_BENCHMARK: f64 = 80.0;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParetoState {
    pub values: Vec<f64>,
}

impl AnalyzerState for ParetoState {
    fn merge(states: Vec<Self>) -> Result<Self> {
        Ok(ParetoState {
            values: concat_chunks(states.into_iter().map(|s| s.values).collect()),
        })
    }
}

/// Gini coefficient of non-negative values sorted ascending, clamped to [0, 1].
///
/// Values are divided by the largest one first, so any finite input works.
pub fn gini_coefficient(ascending: &[f64]) -> f64 {
    let Some(&peak) = ascending.last() else {
        return 0.0;
    };
    if peak <= 0.0 {
        return 0.0;
    }
    let n = ascending.len() as f64;
    let total: f64 = ascending.iter().map(|x| x / peak).sum();
    let weighted: f64 = ascending
        .iter()
        .enumerate()
        .map(|(i, &x)| (i as f64 + 1.0) * (x / peak))
        .sum();
    (2.0 * weighted / (n * total) - (n + 1.0) / n).clamp(0.0, 1.0)
}

#[derive(Debug, Clone)]
pub struct ParetoAnalyzer {
    pareto: ParetoOptions,
}

impl ParetoAnalyzer {
    pub fn new(pareto: ParetoOptions) -> Self {
        Self { pareto }
    }

    pub fn from_options(options: &LawkitOptions) -> Self {
        Self::new(options.pareto.clone())
    }

    fn classify(contribution: f64) -> RiskLevel {
        let distance = (contribution - PARETO_BENCHMARK).abs();
        if distance <= 10.0 {
            RiskLevel::Low
        } else if distance <= 25.0 {
            RiskLevel::Medium
        } else {
            RiskLevel::High
        }
    }
}

impl LawAnalyzer for ParetoAnalyzer {
    type State = ParetoState;

    fn law(&self) -> Law {
        Law::Pareto
    }

    fn compute_state(&self, chunk: &[f64]) -> Result<ParetoState> {
        if let Some(negative) = chunk.iter().find(|&&v| v < 0.0) {
            return Err(LawkitError::invalid_data(format!(
                "Pareto analysis requires non-negative values, found {negative}"
            )));
        }
        Ok(ParetoState {
            values: chunk.to_vec(),
        })
    }

    #[instrument(skip(self, state), fields(analyzer = "pareto"))]
    fn compute_result(&self, label: &str, state: ParetoState) -> Result<AnalysisResult> {
        let mut values = state.values;
        let total_items = values.len();
        if total_items == 0 {
            return Err(LawkitError::insufficient("pareto", 1, 0));
        }
        values.sort_by(|a, b| b.total_cmp(a));
        let peak = values[0];
        if peak <= 0.0 {
            return Err(LawkitError::zero_variance(
                "Pareto analysis requires a positive total",
            ));
        }

        // Shares are computed on values divided by the largest one; the
        // reported total saturates at f64::MAX.
        let scaled_total: f64 = values.iter().map(|v| v / peak).sum();
        let total_value = (scaled_total * peak).min(f64::MAX);

        let top_item_count = ((total_items as f64 * self.pareto.ratio).round() as usize)
            .clamp(1, total_items);
        let top_sum: f64 = values[..top_item_count].iter().map(|v| v / peak).sum();
        let contribution = (100.0 * top_sum / scaled_total).clamp(0.0, 100.0);
        let top_items = values
            .iter()
            .take(self.pareto.category_limit)
            .copied()
            .collect();

        values.reverse();
        let concentration_index = gini_coefficient(&values);
        let risk_level = Self::classify(contribution);
        let top_fraction = top_item_count as f64 / total_items as f64;

        let analysis_summary = format!(
            "Top {:.0}% of items ({} of {}) hold {:.1}% of the total (benchmark {:.0}%); Gini {:.3}; risk {}",
            top_fraction * 100.0,
            top_item_count,
            total_items,
            contribution,
            PARETO_BENCHMARK,
            concentration_index,
            risk_level
        );

        Ok(AnalysisResult::ParetoAnalysis(ParetoData {
            path: label.to_string(),
            top_20_percent_contribution: contribution,
            pareto_ratio: contribution / PARETO_BENCHMARK,
            concentration_index,
            top_fraction,
            top_item_count,
            top_items,
            total_items,
            total_value,
            risk_level,
            analysis_summary,
        }))
    }
}
