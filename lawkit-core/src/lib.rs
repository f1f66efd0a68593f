//! # lawkit - Statistical Law Analysis for Rust
//!
//! lawkit tests numeric datasets against well-known statistical laws
//! (Benford, Pareto, Zipf, Normal and Poisson), scores their data quality,
//! flags anomalies, generates synthetic data that follows a chosen law, and
//! combines several single-law verdicts into one risk assessment. It is built
//! for fraud detection, audit sampling and data-quality monitoring.
//!
//! ## Quick Start
//!
//! ```rust
//! use serde_json::json;
//!
//! # #[tokio::main]
//! # async fn main() -> lawkit_core::Result<()> {
//! let invoices = json!([1234.5, 187.2, 2901.0, 143.8, 1620.0, 118.4, 3305.9, 1411.0]);
//! let results = lawkit_core::law("benford", &invoices, &json!({"confidence_level": 0.99})).await?;
//!
//! for result in &results {
//!     println!("{result}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Subcommands
//!
//! | Subcommand | Result |
//! |------------|--------|
//! | `benford`, `pareto`, `zipf`, `normal`, `poisson` | one law analysis |
//! | `validate` | composite data-quality score |
//! | `diagnose` | robust outlier findings |
//! | `generate` | synthetic data for a law |
//! | `analyze` | every configured law per dataset, then one integration result |
//!
//! ## Input
//!
//! Payloads are arbitrary JSON. Arrays become one dataset, mappings become one
//! dataset per key (nested keys are joined with `.`), and numeric strings are
//! accepted. See [`input`] for the full policy and [`sources`] for reading
//! JSON and CSV files.
//!
//! ## Architecture
//!
//! ```text
//! law() ──> AnalysisRequest ──> normalize ──> analyzers ──> Vec<AnalysisResult>
//!                                   │              │
//!                              NumericDataset  ExecutionPlan (chunked, optionally parallel)
//! ```
//!
//! Analyzers implement [`laws::LawAnalyzer`]: a chunk of values is reduced to a
//! mergeable state, chunk states are merged in order, and the merged state
//! yields the typed result. Parallel and sequential runs therefore produce
//! identical output.
//!
//! ## Logging
//!
//! The engine emits `tracing` spans and events. Binaries install a subscriber
//! with [`logging::setup::init_logging`]; `RUST_LOG` overrides the configured
//! levels.

pub mod core;
pub mod error;
pub mod formatters;
pub mod generate;
pub mod input;
pub mod integration;
pub mod laws;
pub mod logging;
pub mod prelude;
pub mod quality;
pub mod sources;
pub mod stats;

pub use crate::core::law;
pub use crate::error::{LawkitError, Result};
