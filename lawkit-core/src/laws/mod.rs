//! Per-law conformance analyzers.
//!
//! Every analyzer follows the same mergeable-state contract: a chunk of values
//! is reduced to a [`AnalyzerState`], states of consecutive chunks are merged in
//! chunk order, and the merged state is turned into one [`AnalysisResult`].
//! The [`ExecutionPlan`](crate::core::ExecutionPlan) decides how the chunks are
//! scheduled; the analyzers themselves are synchronous pure functions.
//!
//! ## Available Analyzers
//!
//! - [`BenfordAnalyzer`]: leading-digit frequencies against Benford's law
//! - [`ParetoAnalyzer`]: concentration of value in the top slice
//! - [`ZipfAnalyzer`]: rank/size power law via a log-log fit
//! - [`NormalAnalyzer`]: moment-based normality (Jarque–Bera)
//! - [`PoissonAnalyzer`]: index of dispersion for count data

pub mod benford;
pub mod normal;
pub mod pareto;
pub mod poisson;
pub mod zipf;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug};
use std::str::FromStr;
use tracing::instrument;

use crate::core::execution::ExecutionPlan;
use crate::core::options::LawkitOptions;
use crate::core::result::AnalysisResult;
use crate::error::{LawkitError, Result};
use crate::input::NumericDataset;

pub use benford::BenfordAnalyzer;
pub use normal::NormalAnalyzer;
pub use pareto::ParetoAnalyzer;
pub use poisson::PoissonAnalyzer;
pub use zipf::ZipfAnalyzer;

/// The statistical laws the engine can test and generate.
///
/// Declaration order is the canonical order used by `analyze`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Law {
    Benford,
    Pareto,
    Zipf,
    Normal,
    Poisson,
}

impl Law {
    pub const ALL: [Law; 5] = [Law::Benford, Law::Pareto, Law::Zipf, Law::Normal, Law::Poisson];

    pub fn as_str(&self) -> &'static str {
        match self {
            Law::Benford => "benford",
            Law::Pareto => "pareto",
            Law::Zipf => "zipf",
            Law::Normal => "normal",
            Law::Poisson => "poisson",
        }
    }

    /// Human-facing name used in summaries and recommendations.
    pub fn display_name(&self) -> &'static str {
        match self {
            Law::Benford => "Benford's law",
            Law::Pareto => "Pareto principle",
            Law::Zipf => "Zipf's law",
            Law::Normal => "normal distribution",
            Law::Poisson => "Poisson distribution",
        }
    }
}

impl fmt::Display for Law {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Law {
    type Err = LawkitError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "benford" | "benf" => Ok(Law::Benford),
            "pareto" => Ok(Law::Pareto),
            "zipf" => Ok(Law::Zipf),
            "normal" => Ok(Law::Normal),
            "poisson" => Ok(Law::Poisson),
            other => Err(LawkitError::invalid_option(
                "law",
                format!("unknown law '{other}'"),
            )),
        }
    }
}

/// Intermediate result of an analyzer over one chunk.
///
/// States are serializable so partial results can be inspected or cached.
pub trait AnalyzerState: Clone + Send + Sync + Debug + Serialize + DeserializeOwned + 'static {
    /// Merges states of consecutive chunks, in the order given.
    fn merge(states: Vec<Self>) -> Result<Self>
    where
        Self: Sized;
}

/// A law analyzer with incremental, mergeable computation.
///
/// # Example
///
/// ```rust
/// use lawkit_core::core::LawkitOptions;
/// use lawkit_core::laws::{LawAnalyzer, ParetoAnalyzer};
///
/// let analyzer = ParetoAnalyzer::from_options(&LawkitOptions::default());
/// let state = analyzer.compute_state(&[90.0, 5.0, 3.0, 1.0, 1.0]).unwrap();
/// let result = analyzer.compute_result("sales", state).unwrap();
/// assert_eq!(result.path(), "sales");
/// ```
pub trait LawAnalyzer: Clone + Send + Sync + Debug + 'static {
    /// The state type for incremental computation.
    type State: AnalyzerState;

    /// The law this analyzer tests.
    fn law(&self) -> Law;

    /// Reduces one chunk of values. Domain violations fail here.
    fn compute_state(&self, chunk: &[f64]) -> Result<Self::State>;

    /// Merges chunk states in chunk order.
    fn merge_states(&self, states: Vec<Self::State>) -> Result<Self::State> {
        Self::State::merge(states)
    }

    /// Produces the typed result from the merged state.
    fn compute_result(&self, label: &str, state: Self::State) -> Result<AnalysisResult>;

    /// Returns the name of this analyzer.
    fn name(&self) -> &'static str {
        self.law().as_str()
    }

    /// Analyzes a slice as a single chunk.
    fn analyze_values(&self, label: &str, values: &[f64]) -> Result<AnalysisResult> {
        let state = self.compute_state(values)?;
        let merged = self.merge_states(vec![state])?;
        self.compute_result(label, merged)
    }
}

/// Runs one law over one dataset under the request's execution plan.
#[instrument(skip(dataset, options), fields(dataset = %dataset.label, values = dataset.len()))]
pub async fn analyze_law(
    law: Law,
    dataset: &NumericDataset,
    options: &LawkitOptions,
) -> Result<AnalysisResult> {
    let plan = ExecutionPlan::from_options(&options.execution, dataset.len());
    match law {
        Law::Benford => plan.run(&BenfordAnalyzer::from_options(options), dataset).await,
        Law::Pareto => plan.run(&ParetoAnalyzer::from_options(options), dataset).await,
        Law::Zipf => plan.run(&ZipfAnalyzer::from_options(options), dataset).await,
        Law::Normal => plan.run(&NormalAnalyzer::from_options(options), dataset).await,
        Law::Poisson => plan.run(&PoissonAnalyzer::from_options(options), dataset).await,
    }
}

/// Concatenates retained values of consecutive chunks.
pub(crate) fn concat_chunks(chunks: Vec<Vec<f64>>) -> Vec<f64> {
    let total = chunks.iter().map(Vec::len).sum();
    let mut values = Vec::with_capacity(total);
    for chunk in chunks {
        values.extend(chunk);
    }
    values
}
