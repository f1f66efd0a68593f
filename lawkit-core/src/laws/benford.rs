//! Benford's law analysis.
//!
//! Counts significant digits, compares their frequencies against the
//! logarithmic distribution with a Pearson chi-square test and grades the
//! mean absolute deviation (MAD) with Nigrini's conformity thresholds.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, instrument};

use crate::core::level::RiskLevel;
use crate::core::options::{BenfordOptions, LawkitOptions, RiskOptions};
use crate::core::result::{AnalysisResult, BenfordData};
use crate::error::{LawkitError, Result};
use crate::laws::{AnalyzerState, Law, LawAnalyzer};
use crate::stats::chi_square_sf;

/// Minimum number of digit-bearing values.
pub const MIN_BENFORD_VALUES: usize = 5;

/// Sample size from which chi-square alone no longer decides a HIGH verdict.
pub const LARGE_SAMPLE: usize = 1_000;

/// Which significant digits are tested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DigitScheme {
    /// Leading digit, 1..b-1
    #[default]
    First,
    /// Second digit, 0..b-1
    Second,
    /// Leading pair, b..b²-1
    FirstTwo,
}

impl DigitScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            DigitScheme::First => "first",
            DigitScheme::Second => "second",
            DigitScheme::FirstTwo => "first_two",
        }
    }

    /// Number of bins for the given base.
    pub fn bins(&self, base: u32) -> usize {
        let b = base as usize;
        match self {
            DigitScheme::First => b - 1,
            DigitScheme::Second => b,
            DigitScheme::FirstTwo => b * b - b,
        }
    }

    /// Nigrini's MAD cutoffs for close, acceptable and marginal conformity.
    pub fn mad_thresholds(&self) -> [f64; 3] {
        match self {
            DigitScheme::First => [0.006, 0.012, 0.015],
            DigitScheme::Second => [0.008, 0.010, 0.012],
            DigitScheme::FirstTwo => [0.0012, 0.0018, 0.0022],
        }
    }

    /// Benford proportions for every bin, in bin order.
    pub fn expected_distribution(&self, base: u32) -> Vec<f64> {
        let b = f64::from(base);
        let log_b = |x: f64| x.ln() / b.ln();
        match self {
            DigitScheme::First => (1..base)
                .map(|d| log_b(1.0 + 1.0 / f64::from(d)))
                .collect(),
            DigitScheme::Second => (0..base)
                .map(|d| {
                    (1..base)
                        .map(|k| log_b(1.0 + 1.0 / (f64::from(k) * b + f64::from(d))))
                        .sum()
                })
                .collect(),
            DigitScheme::FirstTwo => (base..base * base)
                .map(|d| log_b(1.0 + 1.0 / f64::from(d)))
                .collect(),
        }
    }

    /// Digit (or digit pair) a bin index stands for.
    pub fn bin_value(&self, index: usize, base: u32) -> u32 {
        let index = index as u32;
        match self {
            DigitScheme::First => index + 1,
            DigitScheme::Second => index,
            DigitScheme::FirstTwo => index + base,
        }
    }

    /// Bin index of a value, `None` for zero.
    pub fn bin(&self, value: f64, base: u32) -> Option<usize> {
        let (first, second) = significant_digits(value, base)?;
        let index = match self {
            DigitScheme::First => first - 1,
            DigitScheme::Second => second,
            DigitScheme::FirstTwo => first * base + second - base,
        };
        Some(index as usize)
    }
}

impl fmt::Display for DigitScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DigitScheme {
    type Err = LawkitError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "first" | "1" => Ok(DigitScheme::First),
            "second" | "2" => Ok(DigitScheme::Second),
            "first_two" | "firsttwo" | "12" => Ok(DigitScheme::FirstTwo),
            other => Err(LawkitError::invalid_option(
                "benford_digits",
                format!("expected first, second or first_two, got '{other}'"),
            )),
        }
    }
}

/// Nigrini's MAD conformity grades.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Conformity {
    Close,
    Acceptable,
    Marginal,
    Nonconforming,
}

impl Conformity {
    pub fn classify(mad: f64, scheme: DigitScheme) -> Self {
        let [close, acceptable, marginal] = scheme.mad_thresholds();
        if mad <= close {
            Conformity::Close
        } else if mad <= acceptable {
            Conformity::Acceptable
        } else if mad <= marginal {
            Conformity::Marginal
        } else {
            Conformity::Nonconforming
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Conformity::Close => "close",
            Conformity::Acceptable => "acceptable",
            Conformity::Marginal => "marginal",
            Conformity::Nonconforming => "nonconforming",
        }
    }
}

impl fmt::Display for Conformity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// First and second significant digit of `|value|` in `base`.
///
/// Base 10 reads the digits off the shortest round-trip scientific notation,
/// so decimal literals such as `0.3` keep their written digits. Other bases
/// normalize the mantissa with logarithms. A missing second digit is 0.
pub fn significant_digits(value: f64, base: u32) -> Option<(u32, u32)> {
    let magnitude = value.abs();
    if magnitude == 0.0 || !magnitude.is_finite() {
        return None;
    }

    if base == 10 {
        let formatted = format!("{magnitude:e}");
        let mut chars = formatted.chars();
        let first = chars.next()?.to_digit(10)?;
        let second = match chars.next() {
            Some('.') => chars.next().and_then(|c| c.to_digit(10)).unwrap_or(0),
            _ => 0,
        };
        return Some((first, second));
    }

    let b = f64::from(base);
    let exponent = (magnitude.ln() / b.ln() + 1e-12).floor();
    let mut mantissa = magnitude / b.powf(exponent);
    if mantissa < 1.0 {
        mantissa *= b;
    }
    if mantissa >= b {
        mantissa /= b;
    }
    let first = ((mantissa + 1e-9).floor() as u32).clamp(1, base - 1);
    let second = (((mantissa - f64::from(first)) * b + 1e-9).floor().max(0.0) as u32).min(base - 1);
    Some((first, second))
}

/// Digit counts of one or more chunks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BenfordState {
    pub counts: Vec<u64>,
    /// Values without a significant digit
    pub zeros: u64,
}

impl AnalyzerState for BenfordState {
    fn merge(states: Vec<Self>) -> Result<Self> {
        let mut merged = BenfordState::default();
        for state in states {
            if merged.counts.len() < state.counts.len() {
                merged.counts.resize(state.counts.len(), 0);
            }
            for (total, count) in merged.counts.iter_mut().zip(&state.counts) {
                *total += count;
            }
            merged.zeros += state.zeros;
        }
        Ok(merged)
    }
}

#[derive(Debug, Clone)]
pub struct BenfordAnalyzer {
    benford: BenfordOptions,
    risk: RiskOptions,
}

impl BenfordAnalyzer {
    pub fn new(benford: BenfordOptions, risk: RiskOptions) -> Self {
        Self { benford, risk }
    }

    pub fn from_options(options: &LawkitOptions) -> Self {
        Self::new(options.benford.clone(), options.risk.clone())
    }

    fn classify(&self, p_value: f64, conformity: Conformity, total: usize) -> RiskLevel {
        let risk = self.risk.classify_p_value(p_value);
        if risk == RiskLevel::High && total >= LARGE_SAMPLE && conformity <= Conformity::Acceptable {
            debug!(
                total,
                conformity = %conformity,
                "De-escalating chi-square rejection for a large conforming sample"
            );
            return RiskLevel::Medium;
        }
        risk
    }
}

impl LawAnalyzer for BenfordAnalyzer {
    type State = BenfordState;

    fn law(&self) -> Law {
        Law::Benford
    }

    fn compute_state(&self, chunk: &[f64]) -> Result<BenfordState> {
        let BenfordOptions { digits, base } = self.benford;
        let mut state = BenfordState {
            counts: vec![0; digits.bins(base)],
            zeros: 0,
        };
        for &value in chunk {
            match digits.bin(value, base) {
                Some(bin) if bin < state.counts.len() => state.counts[bin] += 1,
                _ => state.zeros += 1,
            }
        }
        Ok(state)
    }

    #[instrument(skip(self, state), fields(analyzer = "benford"))]
    fn compute_result(&self, label: &str, state: BenfordState) -> Result<AnalysisResult> {
        let BenfordOptions { digits, base } = self.benford;
        let bins = digits.bins(base);
        let mut counts = state.counts;
        counts.resize(bins, 0);

        let total: u64 = counts.iter().sum();
        let total_numbers = total as usize;
        if total_numbers < MIN_BENFORD_VALUES {
            return Err(LawkitError::insufficient(
                "benford",
                MIN_BENFORD_VALUES,
                total_numbers,
            ));
        }

        let n = total as f64;
        let expected = digits.expected_distribution(base);
        let observed: Vec<f64> = counts.iter().map(|&c| c as f64 / n).collect();

        let chi_square: f64 = counts
            .iter()
            .zip(&expected)
            .map(|(&count, &p)| {
                let expected_count = p * n;
                (count as f64 - expected_count).powi(2) / expected_count
            })
            .sum();
        let degrees_of_freedom = bins - 1;
        let p_value = chi_square_sf(chi_square, degrees_of_freedom as f64);

        let mad = observed
            .iter()
            .zip(&expected)
            .map(|(o, e)| (o - e).abs())
            .sum::<f64>()
            / bins as f64;
        let conformity = Conformity::classify(mad, digits);
        let risk_level = self.classify(p_value, conformity, total_numbers);

        let analysis_summary = format!(
            "{} digit test (base {}) on {} numbers: chi-square {:.2} with {} df (p = {:.4}), MAD {:.4} ({} conformity); risk {}",
            digits, base, total_numbers, chi_square, degrees_of_freedom, p_value, mad, conformity, risk_level
        );
        debug!(chi_square, p_value, mad, risk = %risk_level, "Benford analysis complete");

        Ok(AnalysisResult::BenfordAnalysis(BenfordData {
            path: label.to_string(),
            digit_scheme: digits,
            base,
            observed_distribution: observed,
            expected_distribution: expected,
            observed_counts: counts,
            chi_square,
            degrees_of_freedom,
            p_value,
            mad,
            conformity,
            total_numbers,
            risk_level,
            analysis_summary,
        }))
    }
}
