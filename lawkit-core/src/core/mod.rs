//! Core request types for the lawkit engine.
//!
//! ## Overview
//!
//! - **[`AnalysisRequest`]**: a parsed request; [`AnalysisRequest::run`] executes it
//! - **[`Subcommand`]**: what the request asks for
//! - **[`LawkitOptions`]**: typed options, parsed once from the loose mapping
//! - **[`AnalysisResult`]**: the closed set of result variants
//! - **[`RiskLevel`]**: the ordered LOW / MEDIUM / HIGH verdict
//! - **[`ExecutionPlan`]**: chunking and parallelism for one dataset
//!
//! ## Flow
//!
//! ```text
//! law(subcommand, data, options)
//!     ├── LawkitOptions::from_value
//!     ├── normalize ──> NumericDataset*
//!     ├── analyzer / validator / diagnostician / generator
//!     └── Integrator (analyze only)
//! ```

pub mod execution;
pub mod level;
pub mod options;
pub mod request;
pub mod result;

pub use execution::ExecutionPlan;
pub use level::{RiskAggregation, RiskLevel};
pub use options::{
    BenfordOptions, ExecutionOptions, GenerationOptions, InputOptions, IntegrationOptions,
    LawkitOptions, OutputOptions, ParetoOptions, RiskOptions, ValidationOptions,
};
pub use request::{law, AnalysisRequest, Subcommand};
pub use result::{
    AnalysisResult, BenfordData, DiagnosticData, GeneratedData, IntegrationData, NormalData,
    ParetoData, PoissonData, SkippedAnalysis, ValidationData, ZipfData,
};
