//! Error types for the lawkit analysis engine.
//!
//! This module provides the error handling strategy using `thiserror`
//! for automatic error trait implementations. All errors raised by the engine
//! are represented by the `LawkitError` enum.

use thiserror::Error;

/// The main error type for the lawkit engine.
///
/// The first six variants form the engine's error taxonomy and are raised by
/// the normalizer, the option parser and the analyzers. The remaining variants
/// belong to the adapter layer (file ingestion, serialization).
#[derive(Error, Debug)]
pub enum LawkitError {
    /// The requested subcommand is not one the dispatcher knows.
    #[error("Unknown subcommand: {0}")]
    UnknownSubcommand(String),

    /// Normalization extracted zero numeric values from the payload.
    #[error("No valid numbers found")]
    NoValidNumbers,

    /// The dataset is smaller than the analysis requires.
    #[error("Insufficient data points for {analysis}: required at least {required}, found {found}")]
    InsufficientDataPoints {
        /// Name of the analysis that rejected the dataset
        analysis: String,
        /// Minimum number of usable values
        required: usize,
        /// Number of usable values found
        found: usize,
    },

    /// Degenerate input where a ratio or normalization would divide by zero.
    #[error("Zero variance: {0}")]
    ZeroVariance(String),

    /// Domain violation for a specific law.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// An option value outside its valid domain.
    #[error("Invalid option '{option}': {message}")]
    InvalidOption {
        /// Option key as supplied by the caller
        option: String,
        /// What was wrong with the value
        message: String,
    },

    /// Error from I/O operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error when parsing input text.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Error from serialization/deserialization operations.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic internal error for unexpected conditions.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A type alias for `Result<T, LawkitError>`.
///
/// This is the standard `Result` type used throughout the engine.
///
/// # Examples
///
/// ```rust
/// use lawkit_core::error::{LawkitError, Result};
///
/// fn require_values(values: &[f64]) -> Result<()> {
///     if values.is_empty() {
///         return Err(LawkitError::NoValidNumbers);
///     }
///     Ok(())
/// }
///
/// assert!(require_values(&[]).is_err());
/// ```
pub type Result<T> = std::result::Result<T, LawkitError>;

impl LawkitError {
    /// Creates a new insufficient data error for the named analysis.
    pub fn insufficient(analysis: impl Into<String>, required: usize, found: usize) -> Self {
        Self::InsufficientDataPoints {
            analysis: analysis.into(),
            required,
            found,
        }
    }

    /// Creates a new invalid option error.
    pub fn invalid_option(option: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidOption {
            option: option.into(),
            message: message.into(),
        }
    }

    /// Creates a new invalid data error.
    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData(message.into())
    }

    /// Creates a new zero variance error.
    pub fn zero_variance(message: impl Into<String>) -> Self {
        Self::ZeroVariance(message.into())
    }

    /// Returns true for analyzer precondition failures.
    ///
    /// The integrator skips a (dataset, law) pair when its analyzer fails
    /// with one of these; anything else aborts the request.
    pub fn is_skippable(&self) -> bool {
        matches!(
            self,
            Self::NoValidNumbers
                | Self::InsufficientDataPoints { .. }
                | Self::ZeroVariance(_)
                | Self::InvalidData(_)
        )
    }
}

impl From<serde_json::Error> for LawkitError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Extension trait for adding context to errors.
pub trait ErrorContext<T> {
    /// Adds context to an error.
    fn context(self, msg: &str) -> Result<T>;

    /// Adds context with a lazy message.
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: Into<LawkitError>,
{
    fn context(self, msg: &str) -> Result<T> {
        self.with_context(|| msg.to_string())
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| match e.into() {
            LawkitError::Io(inner) => LawkitError::Parse(format!("{}: {}", f(), inner)),
            LawkitError::Parse(inner) => LawkitError::Parse(format!("{}: {}", f(), inner)),
            LawkitError::Serialization(inner) => {
                LawkitError::Serialization(format!("{}: {}", f(), inner))
            }
            LawkitError::Internal(inner) => LawkitError::Internal(format!("{}: {}", f(), inner)),
            other => other,
        })
    }
}
