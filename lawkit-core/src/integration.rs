//! Multi-law integration for the `analyze` subcommand.
//!
//! Every dataset is tested against every configured law. Pairs whose analyzer
//! rejects the data are recorded as skipped instead of failing the request;
//! the surviving per-law results are followed by one
//! [`AnalysisResult::IntegrationAnalysis`] that aggregates their risk.

use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::core::level::RiskLevel;
use crate::core::options::LawkitOptions;
use crate::core::result::{AnalysisResult, IntegrationData, SkippedAnalysis};
use crate::error::{LawkitError, Result};
use crate::input::NumericDataset;
use crate::laws::{analyze_law, Law};

/// Path reported by the integration result.
pub const INTEGRATION_LABEL: &str = "integration";

/// Outcome of one (dataset, law) pair.
#[derive(Debug, Clone)]
enum PairOutcome {
    Analyzed(AnalysisResult),
    Skipped(SkippedAnalysis),
}

/// Runs the configured laws over many datasets and combines the verdicts.
#[derive(Debug, Clone)]
pub struct Integrator {
    options: Arc<LawkitOptions>,
}

impl Integrator {
    pub fn new(options: LawkitOptions) -> Self {
        Self {
            options: Arc::new(options),
        }
    }

    /// Analyzes every dataset and appends the integration result.
    ///
    /// Only non-skippable errors (see [`LawkitError::is_skippable`]) abort.
    #[instrument(skip(self, datasets), fields(datasets = datasets.len(), laws = self.options.integration.laws.len()))]
    pub async fn integrate(&self, datasets: Vec<NumericDataset>) -> Result<Vec<AnalysisResult>> {
        let labels: Vec<String> = datasets.iter().map(|d| d.label.clone()).collect();

        let outcomes = if self.options.execution.parallel && datasets.len() > 1 {
            let mut handles = Vec::with_capacity(datasets.len());
            for dataset in datasets {
                let options = Arc::clone(&self.options);
                let handle =
                    tokio::spawn(async move { analyze_dataset(&options, &dataset).await });
                handles.push(handle);
            }

            let mut outcomes = Vec::new();
            for handle in handles {
                match handle.await {
                    Ok(Ok(dataset_outcomes)) => outcomes.extend(dataset_outcomes),
                    Ok(Err(e)) => return Err(e),
                    Err(e) => return Err(LawkitError::Internal(format!("Task join error: {e}"))),
                }
            }
            outcomes
        } else {
            let mut outcomes = Vec::new();
            for dataset in &datasets {
                outcomes.extend(analyze_dataset(&self.options, dataset).await?);
            }
            outcomes
        };

        let mut results = Vec::new();
        let mut skipped = Vec::new();
        for outcome in outcomes {
            match outcome {
                PairOutcome::Analyzed(result) => results.push(result),
                PairOutcome::Skipped(skip) => skipped.push(skip),
            }
        }

        let summary = self.summarize(labels, &results, skipped);
        info!(
            analyzed = results.len(),
            skipped = summary.skipped.len(),
            overall_risk = %summary.overall_risk,
            "Integration complete"
        );
        results.push(AnalysisResult::IntegrationAnalysis(summary));
        Ok(results)
    }

    fn summarize(
        &self,
        datasets_analyzed: Vec<String>,
        results: &[AnalysisResult],
        skipped: Vec<SkippedAnalysis>,
    ) -> IntegrationData {
        let risk = &self.options.risk;

        let laws_analyzed: Vec<Law> = results
            .iter()
            .filter_map(AnalysisResult::law)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let overall = risk
            .aggregation
            .combine(results.iter().filter_map(AnalysisResult::risk_level));
        let overall_risk = overall.unwrap_or(RiskLevel::Low);

        let conflicting_results = find_conflicts(&datasets_analyzed, results);
        let recommendations = if self.options.output.show_recommendations {
            recommend(results, risk.risk_threshold)
        } else {
            Vec::new()
        };

        let analysis_summary = if overall.is_none() {
            format!(
                "No law could be evaluated on {} dataset(s); {} analyses skipped; overall risk {}",
                datasets_analyzed.len(),
                skipped.len(),
                overall_risk
            )
        } else {
            format!(
                "{} analyses across {} dataset(s) and {} law(s); overall risk {} ({} aggregation); {} skipped, {} conflicting",
                results.len(),
                datasets_analyzed.len(),
                laws_analyzed.len(),
                overall_risk,
                risk.aggregation,
                skipped.len(),
                conflicting_results.len()
            )
        };

        IntegrationData {
            path: INTEGRATION_LABEL.to_string(),
            laws_analyzed,
            datasets_analyzed,
            overall_risk,
            skipped,
            conflicting_results,
            recommendations,
            analysis_summary,
        }
    }
}

async fn analyze_dataset(
    options: &LawkitOptions,
    dataset: &NumericDataset,
) -> Result<Vec<PairOutcome>> {
    let mut outcomes = Vec::with_capacity(options.integration.laws.len());
    for &law in &options.integration.laws {
        match analyze_law(law, dataset, options).await {
            Ok(result) => {
                debug!(dataset = %dataset.label, law = %law, risk = ?result.risk_level(), "Law analyzed");
                outcomes.push(PairOutcome::Analyzed(result));
            }
            Err(e) if e.is_skippable() => {
                warn!(dataset = %dataset.label, law = %law, error = %e, "Skipping law for dataset");
                outcomes.push(PairOutcome::Skipped(SkippedAnalysis {
                    path: dataset.label.clone(),
                    law,
                    reason: e.to_string(),
                }));
            }
            Err(e) => return Err(e),
        }
    }
    Ok(outcomes)
}

/// One message per dataset where some law says LOW and another says HIGH.
fn find_conflicts(labels: &[String], results: &[AnalysisResult]) -> Vec<String> {
    let laws_at = |label: &str, level: RiskLevel| -> Vec<&'static str> {
        results
            .iter()
            .filter(|r| r.path() == label && r.risk_level() == Some(level))
            .filter_map(|r| r.law().map(|law| law.as_str()))
            .collect()
    };

    labels
        .iter()
        .filter_map(|label| {
            let low = laws_at(label, RiskLevel::Low);
            let high = laws_at(label, RiskLevel::High);
            if low.is_empty() || high.is_empty() {
                return None;
            }
            Some(format!(
                "Dataset '{}': {} report LOW risk while {} report HIGH risk",
                label,
                low.join(", "),
                high.join(", ")
            ))
        })
        .collect()
}

fn guidance(law: Law) -> &'static str {
    match law {
        Law::Benford => {
            "audit the records driving the leading-digit deviation for rounding, thresholds or fabricated figures"
        }
        Law::Pareto => {
            "review how value concentrates in the top items; the split departs from the 80/20 benchmark"
        }
        Law::Zipf => "check the ranking for truncation, mixed sources or artificial ordering",
        Law::Normal => {
            "inspect skew, heavy tails and outliers before relying on normal-theory methods"
        }
        Law::Poisson => "investigate clustered or suspiciously regular event counts",
    }
}

fn recommend(results: &[AnalysisResult], threshold: RiskLevel) -> Vec<String> {
    let flagged: Vec<String> = results
        .iter()
        .filter_map(|result| {
            let law = result.law()?;
            let level = result.risk_level()?;
            level.is_at_least(threshold).then(|| {
                format!(
                    "[{}] {} risk for {}: {}",
                    result.path(),
                    level,
                    law.display_name(),
                    guidance(law)
                )
            })
        })
        .collect();

    if flagged.is_empty() {
        vec![format!(
            "No law flagged at or above {threshold} risk; continue routine monitoring"
        )]
    } else {
        flagged
    }
}
