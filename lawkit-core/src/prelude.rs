//! Prelude for commonly used types and traits in lawkit-core.

pub use crate::core::{
    law, AnalysisRequest, AnalysisResult, LawkitOptions, RiskAggregation, RiskLevel, Subcommand,
};
pub use crate::error::{ErrorContext, LawkitError, Result};
pub use crate::formatters::{FormatterConfig, OutputFormat, ResultFormatter};
pub use crate::input::NumericDataset;
pub use crate::laws::{Law, LawAnalyzer};
