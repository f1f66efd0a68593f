//! Risk levels reported by the analyzers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::LawkitError;

/// How strongly a dataset deviates from the law it was tested against.
///
/// Levels are ordered by severity: High > Medium > Low, so combining several
/// results is a matter of taking the maximum.
///
/// # Usage Guidelines
///
/// - **Low**: the data is consistent with the law at the configured
///   significance level.
/// - **Medium**: a moderate deviation worth a second look.
/// - **High**: a sharp deviation; in audit settings this is the level that
///   should trigger manual review.
///
/// # Comparison
///
/// ```rust
/// use lawkit_core::core::RiskLevel;
///
/// assert!(RiskLevel::High > RiskLevel::Medium);
/// assert!(RiskLevel::Medium > RiskLevel::Low);
/// assert_eq!(
///     [RiskLevel::Low, RiskLevel::High, RiskLevel::Medium].into_iter().max(),
///     Some(RiskLevel::High)
/// );
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    /// Consistent with the law
    #[default]
    Low = 0,
    /// Moderate deviation
    Medium = 1,
    /// Sharp deviation
    High = 2,
}

impl RiskLevel {
    /// All levels, least severe first.
    pub const ALL: [RiskLevel; 3] = [RiskLevel::Low, RiskLevel::Medium, RiskLevel::High];

    /// Returns the string representation of the level.
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
        }
    }

    /// Checks if this level is at least as severe as another level.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use lawkit_core::core::RiskLevel;
    ///
    /// assert!(RiskLevel::High.is_at_least(RiskLevel::Medium));
    /// assert!(RiskLevel::Medium.is_at_least(RiskLevel::Medium));
    /// assert!(!RiskLevel::Low.is_at_least(RiskLevel::High));
    /// ```
    pub fn is_at_least(&self, other: RiskLevel) -> bool {
        *self >= other
    }

    /// Ordinal weight used when averaging levels.
    pub fn ordinal(&self) -> u8 {
        *self as u8
    }

    /// Level for a (rounded) ordinal, saturating at `High`.
    pub fn from_ordinal(ordinal: u8) -> Self {
        match ordinal {
            0 => RiskLevel::Low,
            1 => RiskLevel::Medium,
            _ => RiskLevel::High,
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RiskLevel {
    type Err = LawkitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(RiskLevel::Low),
            "medium" => Ok(RiskLevel::Medium),
            "high" => Ok(RiskLevel::High),
            other => Err(LawkitError::invalid_option(
                "risk_threshold",
                format!("expected low, medium or high, got '{other}'"),
            )),
        }
    }
}

/// How several risk levels are folded into one overall verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskAggregation {
    /// The most severe level wins
    #[default]
    Max,
    /// Rounded mean of the level ordinals
    Average,
}

impl RiskAggregation {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskAggregation::Max => "max",
            RiskAggregation::Average => "average",
        }
    }

    /// Combines levels, returning `None` when there is nothing to combine.
    pub fn combine<I>(&self, levels: I) -> Option<RiskLevel>
    where
        I: IntoIterator<Item = RiskLevel>,
    {
        match self {
            RiskAggregation::Max => levels.into_iter().max(),
            RiskAggregation::Average => {
                let (sum, count) = levels
                    .into_iter()
                    .fold((0u32, 0u32), |(sum, count), level| {
                        (sum + u32::from(level.ordinal()), count + 1)
                    });
                if count == 0 {
                    return None;
                }
                let mean = f64::from(sum) / f64::from(count);
                Some(RiskLevel::from_ordinal(mean.round() as u8))
            }
        }
    }
}

impl fmt::Display for RiskAggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskAggregation {
    type Err = LawkitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "max" | "maximum" => Ok(RiskAggregation::Max),
            "average" | "mean" => Ok(RiskAggregation::Average),
            other => Err(LawkitError::invalid_option(
                "risk_aggregation",
                format!("expected max or average, got '{other}'"),
            )),
        }
    }
}
