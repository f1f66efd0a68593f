//! Request dispatch: the single entry point into the engine.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, instrument};

use crate::core::options::LawkitOptions;
use crate::core::result::AnalysisResult;
use crate::error::{LawkitError, Result};
use crate::generate::{GenerationConfig, Generator};
use crate::input::{normalize, NumericDataset};
use crate::integration::Integrator;
use crate::laws::{analyze_law, Law};
use crate::quality::{Diagnostician, Validator};

/// What a request asks the engine to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Subcommand {
    Benford,
    Pareto,
    Zipf,
    Normal,
    Poisson,
    Validate,
    Diagnose,
    Generate,
    Analyze,
}

impl Subcommand {
    pub const ALL: [Subcommand; 9] = [
        Subcommand::Benford,
        Subcommand::Pareto,
        Subcommand::Zipf,
        Subcommand::Normal,
        Subcommand::Poisson,
        Subcommand::Validate,
        Subcommand::Diagnose,
        Subcommand::Generate,
        Subcommand::Analyze,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Subcommand::Benford => "benford",
            Subcommand::Pareto => "pareto",
            Subcommand::Zipf => "zipf",
            Subcommand::Normal => "normal",
            Subcommand::Poisson => "poisson",
            Subcommand::Validate => "validate",
            Subcommand::Diagnose => "diagnose",
            Subcommand::Generate => "generate",
            Subcommand::Analyze => "analyze",
        }
    }

    /// The law a single-law subcommand tests.
    pub fn law(&self) -> Option<Law> {
        match self {
            Subcommand::Benford => Some(Law::Benford),
            Subcommand::Pareto => Some(Law::Pareto),
            Subcommand::Zipf => Some(Law::Zipf),
            Subcommand::Normal => Some(Law::Normal),
            Subcommand::Poisson => Some(Law::Poisson),
            Subcommand::Validate
            | Subcommand::Diagnose
            | Subcommand::Generate
            | Subcommand::Analyze => None,
        }
    }
}

impl fmt::Display for Subcommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Subcommand {
    type Err = LawkitError;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim().to_ascii_lowercase();
        if name == "benf" {
            return Ok(Subcommand::Benford);
        }
        Self::ALL
            .into_iter()
            .find(|subcommand| subcommand.as_str() == name)
            .ok_or_else(|| LawkitError::UnknownSubcommand(s.to_string()))
    }
}

/// One fully parsed engine request.
///
/// # Examples
///
/// ```rust
/// use lawkit_core::core::{AnalysisRequest, LawkitOptions, Subcommand};
/// use serde_json::json;
///
/// # #[tokio::main]
/// # async fn main() -> lawkit_core::Result<()> {
/// let request = AnalysisRequest::new(
///     Subcommand::Pareto,
///     json!([900, 850, 30, 20, 15, 10, 8, 5, 4, 3]),
///     LawkitOptions::default(),
/// );
/// let results = request.run().await?;
/// assert_eq!(results.len(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    subcommand: Subcommand,
    payload: Value,
    options: LawkitOptions,
}

impl AnalysisRequest {
    pub fn new(subcommand: Subcommand, payload: Value, options: LawkitOptions) -> Self {
        Self {
            subcommand,
            payload,
            options,
        }
    }

    /// Builds a request from the loose forms accepted by [`crate::law`].
    pub fn parse(subcommand: &str, payload: &Value, options: &Value) -> Result<Self> {
        let subcommand = subcommand.parse()?;
        let options = LawkitOptions::from_value(options)?;
        Ok(Self::new(subcommand, payload.clone(), options))
    }

    pub fn subcommand(&self) -> Subcommand {
        self.subcommand
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    pub fn options(&self) -> &LawkitOptions {
        &self.options
    }

    /// Executes the request.
    ///
    /// Single-law, `validate` and `diagnose` requests return one result, or
    /// one per dataset with `split_groups`. `analyze` returns the per-law
    /// results followed by one integration result; `generate` returns one
    /// generated dataset.
    #[instrument(skip(self), fields(subcommand = %self.subcommand))]
    pub async fn run(&self) -> Result<Vec<AnalysisResult>> {
        let options = &self.options;

        match self.subcommand {
            Subcommand::Generate => {
                let config = GenerationConfig::from_payload(&self.payload, &options.generation)?;
                let data = Generator::new(options.generation.clone()).generate(&config)?;
                Ok(vec![AnalysisResult::GeneratedData(data)])
            }
            Subcommand::Analyze => {
                let datasets = normalize(&self.payload, &options.input)?;
                Integrator::new(options.clone()).integrate(datasets).await
            }
            subcommand => {
                let datasets = self.grouped_datasets()?;
                let mut results = Vec::with_capacity(datasets.len());
                for dataset in &datasets {
                    let result = match subcommand.law() {
                        Some(law) => analyze_law(law, dataset, options).await?,
                        None if subcommand == Subcommand::Validate => {
                            AnalysisResult::ValidationResult(
                                Validator::from_options(options).validate(dataset),
                            )
                        }
                        None => AnalysisResult::DiagnosticResult(
                            Diagnostician::from_options(options).diagnose(dataset),
                        ),
                    };
                    results.push(result);
                }
                debug!(results = results.len(), "Request complete");
                Ok(results)
            }
        }
    }

    /// Datasets for subcommands that do not integrate: pooled unless
    /// `split_groups` asks for one result per group.
    fn grouped_datasets(&self) -> Result<Vec<NumericDataset>> {
        let datasets = normalize(&self.payload, &self.options.input)?;
        if self.options.input.split_groups {
            return Ok(datasets);
        }
        let pooled = NumericDataset::pool(datasets).ok_or(LawkitError::NoValidNumbers)?;
        Ok(vec![pooled])
    }
}

/// Runs `subcommand` over `data` with a loose option mapping.
///
/// This is the engine's entry point; see [`AnalysisRequest`] for the typed
/// equivalent.
///
/// # Examples
///
/// ```rust
/// use serde_json::json;
///
/// # #[tokio::main]
/// # async fn main() -> lawkit_core::Result<()> {
/// let data = json!({"q1": [120, 45, 300, 18], "q2": [75, 1900, 22, 510]});
/// let results = lawkit_core::law("diagnose", &data, &json!(null)).await?;
/// assert_eq!(results[0].path(), "combined");
/// # Ok(())
/// # }
/// ```
pub async fn law(subcommand: &str, data: &Value, options: &Value) -> Result<Vec<AnalysisResult>> {
    AnalysisRequest::parse(subcommand, data, options)?.run().await
}
