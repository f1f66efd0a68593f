//! Typed analysis options.
//!
//! The engine receives options as a loose JSON mapping. [`LawkitOptions::from_value`]
//! parses that mapping once into typed sub-configurations; every consumer
//! downstream works with the typed form. Unrecognized keys are ignored, values
//! outside their domain fail with [`LawkitError::InvalidOption`].

use glob::Pattern;
use regex::Regex;
use serde_json::{Map, Value};
use std::str::FromStr;

use crate::core::level::{RiskAggregation, RiskLevel};
use crate::error::{LawkitError, Result};
use crate::formatters::OutputFormat;
use crate::laws::benford::DigitScheme;
use crate::laws::Law;

/// Chunk size used when no memory limit is configured.
pub const DEFAULT_CHUNK_SIZE: usize = 65_536;

/// Smallest chunk the memory limit can push the plan down to.
pub const MIN_CHUNK_SIZE: usize = 1_024;

/// Confidence and risk-classification settings.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskOptions {
    pub confidence_level: f64,
    pub significance_level: f64,
    /// Minimum level that produces a recommendation in `analyze`
    pub risk_threshold: RiskLevel,
    pub aggregation: RiskAggregation,
}

impl Default for RiskOptions {
    fn default() -> Self {
        Self {
            confidence_level: 0.95,
            significance_level: 0.05,
            risk_threshold: RiskLevel::Medium,
            aggregation: RiskAggregation::Max,
        }
    }
}

impl RiskOptions {
    /// Cutoff below which a p-value is treated as a sharp deviation.
    pub fn strict_level(&self) -> f64 {
        self.significance_level / 5.0
    }

    /// Classifies a goodness-of-fit p-value.
    pub fn classify_p_value(&self, p_value: f64) -> RiskLevel {
        if p_value > self.significance_level {
            RiskLevel::Low
        } else if p_value < self.strict_level() {
            RiskLevel::High
        } else {
            RiskLevel::Medium
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BenfordOptions {
    pub digits: DigitScheme,
    pub base: u32,
}

impl Default for BenfordOptions {
    fn default() -> Self {
        Self {
            digits: DigitScheme::First,
            base: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParetoOptions {
    /// Fraction of items counted as "the top"
    pub ratio: f64,
    /// Maximum number of entries reported in `top_items`
    pub category_limit: usize,
}

impl Default for ParetoOptions {
    fn default() -> Self {
        Self {
            ratio: 0.2,
            category_limit: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidationOptions {
    pub min_sample_size: usize,
    pub enable_outlier_detection: bool,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            min_sample_size: 10,
            enable_outlier_detection: true,
        }
    }
}

/// Generator fallbacks; the generation payload overrides each of them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationOptions {
    pub count: Option<usize>,
    pub seed: Option<u64>,
    pub range_min: Option<f64>,
    pub range_max: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IntegrationOptions {
    /// Laws run by `analyze`, always in canonical law order
    pub laws: Vec<Law>,
}

impl Default for IntegrationOptions {
    fn default() -> Self {
        Self {
            laws: Law::ALL.to_vec(),
        }
    }
}

/// Normalizer policy.
#[derive(Debug, Clone, Default)]
pub struct InputOptions {
    pub international_numerals: bool,
    pub ignore_keys: Option<Regex>,
    pub path_filter: Option<Pattern>,
    pub split_groups: bool,
}

impl PartialEq for InputOptions {
    fn eq(&self, other: &Self) -> bool {
        self.international_numerals == other.international_numerals
            && self.split_groups == other.split_groups
            && self.ignore_keys.as_ref().map(Regex::as_str)
                == other.ignore_keys.as_ref().map(Regex::as_str)
            && self.path_filter.as_ref().map(Pattern::as_str)
                == other.path_filter.as_ref().map(Pattern::as_str)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionOptions {
    pub parallel: bool,
    pub memory_limit_mb: Option<usize>,
    pub chunk_size: usize,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self {
            parallel: false,
            memory_limit_mb: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutputOptions {
    pub format: OutputFormat,
    pub show_details: bool,
    pub show_recommendations: bool,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            format: OutputFormat::Text,
            show_details: true,
            show_recommendations: true,
        }
    }
}

/// All options of one request.
///
/// # Examples
///
/// ```rust
/// use lawkit_core::core::LawkitOptions;
/// use serde_json::json;
///
/// let options = LawkitOptions::from_value(&json!({
///     "confidence_level": 0.99,
///     "laws_to_check": "poisson,benford",
/// }))
/// .unwrap();
///
/// assert!((options.risk.significance_level - 0.01).abs() < 1e-12);
/// assert_eq!(options.integration.laws.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LawkitOptions {
    pub risk: RiskOptions,
    pub benford: BenfordOptions,
    pub pareto: ParetoOptions,
    pub validation: ValidationOptions,
    pub generation: GenerationOptions,
    pub integration: IntegrationOptions,
    pub input: InputOptions,
    pub execution: ExecutionOptions,
    pub output: OutputOptions,
}

impl LawkitOptions {
    /// Parses an option mapping. `null` yields the defaults.
    pub fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Null => Ok(Self::default()),
            Value::Object(map) => Self::from_map(map),
            other => Err(LawkitError::invalid_option(
                "options",
                format!("expected an object or null, got {}", json_kind(other)),
            )),
        }
    }

    fn from_map(map: &Map<String, Value>) -> Result<Self> {
        let mut options = Self::default();

        if let Some(confidence) = get_f64(map, "confidence_level")? {
            options = options.with_confidence_level(confidence)?;
        }
        if let Some(significance) = get_f64(map, "significance_level")? {
            options = options.with_significance_level(significance)?;
        }
        if let Some(threshold) = get_str(map, "risk_threshold")? {
            options.risk.risk_threshold = threshold.parse()?;
        }
        if let Some(aggregation) = get_str(map, "risk_aggregation")? {
            options.risk.aggregation = aggregation.parse()?;
        }

        if let Some(digits) = get_str(map, "benford_digits")? {
            options.benford.digits = digits.parse()?;
        }
        if let Some(base) = get_u64(map, "benford_base")? {
            options = options.with_benford_base(u32::try_from(base).unwrap_or(u32::MAX))?;
        }

        if let Some(ratio) = get_f64(map, "pareto_ratio")? {
            options = options.with_pareto_ratio(ratio)?;
        }
        if let Some(limit) = get_usize(map, "pareto_category_limit")? {
            if limit == 0 {
                return Err(LawkitError::invalid_option(
                    "pareto_category_limit",
                    "must be at least 1",
                ));
            }
            options.pareto.category_limit = limit;
        }

        if let Some(min) = get_usize(map, "min_sample_size")? {
            if min == 0 {
                return Err(LawkitError::invalid_option(
                    "min_sample_size",
                    "must be at least 1",
                ));
            }
            options.validation.min_sample_size = min;
        }
        if let Some(enabled) = get_bool(map, "enable_outlier_detection")? {
            options.validation.enable_outlier_detection = enabled;
        }

        if let Some(laws) = map.get("laws_to_check") {
            options.integration.laws = parse_laws(laws)?;
        }

        options.generation = parse_generation(map)?;

        let international = get_bool(map, "enable_international_numerals")?.unwrap_or(false);
        let japanese = get_bool(map, "enable_japanese_numerals")?.unwrap_or(false);
        options.input.international_numerals = international || japanese;
        if let Some(pattern) = get_str(map, "ignore_keys_regex")? {
            options = options.with_ignore_keys(pattern)?;
        }
        if let Some(pattern) = get_str(map, "path_filter")? {
            options = options.with_path_filter(pattern)?;
        }
        if let Some(split) = get_bool(map, "split_groups")? {
            options.input.split_groups = split;
        }

        if let Some(parallel) = get_bool(map, "enable_parallel_processing")? {
            options.execution.parallel = parallel;
        }
        if let Some(limit) = get_usize(map, "memory_limit_mb")? {
            if limit == 0 {
                return Err(LawkitError::invalid_option(
                    "memory_limit_mb",
                    "must be at least 1",
                ));
            }
            options.execution.memory_limit_mb = Some(limit);
        }
        if let Some(batch) = get_usize(map, "batch_size")? {
            options = options
                .with_chunk_size(batch)
                .map_err(|_| LawkitError::invalid_option("batch_size", "must be at least 1"))?;
        }

        if let Some(format) = get_str(map, "output_format")? {
            options.output.format = format.parse()?;
        }
        if let Some(details) = get_bool(map, "show_details")? {
            options.output.show_details = details;
        }
        if let Some(recommendations) = get_bool(map, "show_recommendations")? {
            options.output.show_recommendations = recommendations;
        }

        Ok(options)
    }

    /// Sets the confidence level; the significance level follows as its complement.
    pub fn with_confidence_level(mut self, confidence: f64) -> Result<Self> {
        check_open_unit("confidence_level", confidence)?;
        self.risk.confidence_level = confidence;
        self.risk.significance_level = 1.0 - confidence;
        Ok(self)
    }

    /// Overrides the significance level derived from the confidence level.
    pub fn with_significance_level(mut self, significance: f64) -> Result<Self> {
        check_open_unit("significance_level", significance)?;
        self.risk.significance_level = significance;
        Ok(self)
    }

    pub fn with_risk_threshold(mut self, threshold: RiskLevel) -> Self {
        self.risk.risk_threshold = threshold;
        self
    }

    pub fn with_risk_aggregation(mut self, aggregation: RiskAggregation) -> Self {
        self.risk.aggregation = aggregation;
        self
    }

    pub fn with_benford_digits(mut self, digits: DigitScheme) -> Self {
        self.benford.digits = digits;
        self
    }

    pub fn with_benford_base(mut self, base: u32) -> Result<Self> {
        if !(3..=36).contains(&base) {
            return Err(LawkitError::invalid_option(
                "benford_base",
                format!("must be between 3 and 36, got {base}"),
            ));
        }
        self.benford.base = base;
        Ok(self)
    }

    pub fn with_pareto_ratio(mut self, ratio: f64) -> Result<Self> {
        if !(ratio > 0.0 && ratio <= 1.0) {
            return Err(LawkitError::invalid_option(
                "pareto_ratio",
                format!("must be in (0, 1], got {ratio}"),
            ));
        }
        self.pareto.ratio = ratio;
        Ok(self)
    }

    pub fn with_laws(mut self, laws: impl IntoIterator<Item = Law>) -> Self {
        self.integration.laws = canonical_laws(laws);
        self
    }

    pub fn with_outlier_detection(mut self, enabled: bool) -> Self {
        self.validation.enable_outlier_detection = enabled;
        self
    }

    pub fn with_international_numerals(mut self, enabled: bool) -> Self {
        self.input.international_numerals = enabled;
        self
    }

    pub fn with_ignore_keys(mut self, pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern)
            .map_err(|e| LawkitError::invalid_option("ignore_keys_regex", e.to_string()))?;
        self.input.ignore_keys = Some(regex);
        Ok(self)
    }

    pub fn with_path_filter(mut self, pattern: &str) -> Result<Self> {
        let glob = Pattern::new(pattern)
            .map_err(|e| LawkitError::invalid_option("path_filter", e.to_string()))?;
        self.input.path_filter = Some(glob);
        Ok(self)
    }

    pub fn with_split_groups(mut self, split: bool) -> Self {
        self.input.split_groups = split;
        self
    }

    pub fn with_parallel_processing(mut self, enabled: bool) -> Self {
        self.execution.parallel = enabled;
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(LawkitError::invalid_option(
                "chunk_size",
                "must be at least 1",
            ));
        }
        self.execution.chunk_size = chunk_size;
        Ok(self)
    }

    pub fn with_memory_limit_mb(mut self, limit: usize) -> Self {
        self.execution.memory_limit_mb = Some(limit.max(1));
        self
    }

    pub fn with_generate_seed(mut self, seed: u64) -> Self {
        self.generation.seed = Some(seed);
        self
    }

    pub fn with_generate_count(mut self, count: usize) -> Self {
        self.generation.count = Some(count);
        self
    }

    pub fn with_show_recommendations(mut self, show: bool) -> Self {
        self.output.show_recommendations = show;
        self
    }

    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output.format = format;
        self
    }
}

fn check_open_unit(option: &str, value: f64) -> Result<()> {
    if value > 0.0 && value < 1.0 {
        Ok(())
    } else {
        Err(LawkitError::invalid_option(
            option,
            format!("must be in (0, 1), got {value}"),
        ))
    }
}

fn parse_generation(map: &Map<String, Value>) -> Result<GenerationOptions> {
    let count = get_usize(map, "generate_count")?;
    if count == Some(0) {
        return Err(LawkitError::invalid_option(
            "generate_count",
            "must be at least 1",
        ));
    }
    let range_min = get_f64(map, "generate_range_min")?;
    let range_max = get_f64(map, "generate_range_max")?;
    if let (Some(min), Some(max)) = (range_min, range_max) {
        if min >= max {
            return Err(LawkitError::invalid_option(
                "generate_range_min",
                format!("must be below generate_range_max ({min} >= {max})"),
            ));
        }
    }
    Ok(GenerationOptions {
        count,
        seed: get_u64(map, "generate_seed")?,
        range_min,
        range_max,
    })
}

fn parse_laws(value: &Value) -> Result<Vec<Law>> {
    let names: Vec<String> = match value {
        Value::String(list) => list.split(',').map(str::to_string).collect(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(name) => Ok(name.clone()),
                other => Err(LawkitError::invalid_option(
                    "laws_to_check",
                    format!("expected law names, got {}", json_kind(other)),
                )),
            })
            .collect::<Result<_>>()?,
        other => {
            return Err(LawkitError::invalid_option(
                "laws_to_check",
                format!("expected a list or a comma separated string, got {}", json_kind(other)),
            ))
        }
    };

    let laws = names
        .iter()
        .map(|name| name.trim())
        .filter(|name| !name.is_empty())
        .map(|name| {
            Law::from_str(name)
                .map_err(|_| LawkitError::invalid_option("laws_to_check", format!("unknown law '{name}'")))
        })
        .collect::<Result<Vec<_>>>()?;

    if laws.is_empty() {
        return Err(LawkitError::invalid_option(
            "laws_to_check",
            "at least one law is required",
        ));
    }
    Ok(canonical_laws(laws))
}

/// Deduplicates and sorts laws into canonical order.
fn canonical_laws(laws: impl IntoIterator<Item = Law>) -> Vec<Law> {
    let mut laws: Vec<Law> = laws.into_iter().collect();
    laws.sort();
    laws.dedup();
    laws
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn get_f64(map: &Map<String, Value>, key: &str) -> Result<Option<f64>> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_f64()
            .filter(|v| v.is_finite())
            .map(Some)
            .ok_or_else(|| LawkitError::invalid_option(key, "expected a finite number")),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(Some)
            .ok_or_else(|| LawkitError::invalid_option(key, format!("expected a number, got '{s}'"))),
        Some(other) => Err(LawkitError::invalid_option(
            key,
            format!("expected a number, got {}", json_kind(other)),
        )),
    }
}

fn get_u64(map: &Map<String, Value>, key: &str) -> Result<Option<u64>> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n.as_u64().map(Some).ok_or_else(|| {
            LawkitError::invalid_option(key, format!("expected a non-negative integer, got {n}"))
        }),
        Some(Value::String(s)) => s.trim().parse::<u64>().map(Some).map_err(|_| {
            LawkitError::invalid_option(key, format!("expected a non-negative integer, got '{s}'"))
        }),
        Some(other) => Err(LawkitError::invalid_option(
            key,
            format!("expected a non-negative integer, got {}", json_kind(other)),
        )),
    }
}

fn get_usize(map: &Map<String, Value>, key: &str) -> Result<Option<usize>> {
    get_u64(map, key)?
        .map(|v| {
            usize::try_from(v)
                .map_err(|_| LawkitError::invalid_option(key, format!("{v} is out of range")))
        })
        .transpose()
}

fn get_bool(map: &Map<String, Value>, key: &str) -> Result<Option<bool>> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" | "on" => Ok(Some(true)),
            "false" | "no" | "0" | "off" => Ok(Some(false)),
            _ => Err(LawkitError::invalid_option(
                key,
                format!("expected a boolean, got '{s}'"),
            )),
        },
        Some(other) => Err(LawkitError::invalid_option(
            key,
            format!("expected a boolean, got {}", json_kind(other)),
        )),
    }
}

fn get_str<'a>(map: &'a Map<String, Value>, key: &str) -> Result<Option<&'a str>> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(other) => Err(LawkitError::invalid_option(
            key,
            format!("expected a string, got {}", json_kind(other)),
        )),
    }
}
