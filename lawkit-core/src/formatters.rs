//! Result formatting for lawkit analysis output.
//!
//! A request produces an ordered sequence of [`AnalysisResult`]s. The
//! formatters here render that sequence as JSON, human-readable text, or
//! Markdown for reports.
//!
//! # Examples
//!
//! ```rust
//! use lawkit_core::formatters::{formatter_for, OutputFormat};
//!
//! let formatter = formatter_for(OutputFormat::Json);
//! let output = formatter.format(&[]).unwrap();
//! assert_eq!(output.trim(), "[]");
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::{self, Write};
use std::str::FromStr;

use crate::core::level::RiskLevel;
use crate::core::options::OutputOptions;
use crate::core::result::AnalysisResult;
use crate::error::{LawkitError, Result};

/// Number of generated values shown by the text formatters.
pub const SAMPLE_PREVIEW: usize = 10;

/// Fields dropped from JSON output when details are hidden.
const DETAIL_FIELDS: [&str; 6] = [
    "observed_distribution",
    "expected_distribution",
    "observed_counts",
    "top_items",
    "outlier_indices",
    "sample_data",
];

/// Output formats understood by the adapters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Markdown,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Text => "text",
            OutputFormat::Json => "json",
            OutputFormat::Markdown => "markdown",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = LawkitError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "human" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            other => Err(LawkitError::invalid_option(
                "output_format",
                format!("expected text, json or markdown, got '{other}'"),
            )),
        }
    }
}

/// Configuration options for rendering results.
#[derive(Debug, Clone)]
pub struct FormatterConfig {
    /// Include distributions, item lists and findings
    pub show_details: bool,
    /// Include the integrator's recommendations
    pub show_recommendations: bool,
    /// Colorize risk levels (human formatter)
    pub use_colors: bool,
    /// Maximum entries shown per list; `None` shows all
    pub max_items: Option<usize>,
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            show_details: true,
            show_recommendations: true,
            use_colors: false,
            max_items: None,
        }
    }
}

impl FormatterConfig {
    /// Creates a configuration showing only summaries and headline metrics.
    pub fn minimal() -> Self {
        Self {
            show_details: false,
            show_recommendations: false,
            use_colors: false,
            max_items: Some(0),
        }
    }

    pub fn from_options(options: &OutputOptions) -> Self {
        Self {
            show_details: options.show_details,
            show_recommendations: options.show_recommendations,
            ..Self::default()
        }
    }

    pub fn with_details(mut self, show: bool) -> Self {
        self.show_details = show;
        self
    }

    pub fn with_recommendations(mut self, show: bool) -> Self {
        self.show_recommendations = show;
        self
    }

    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    pub fn with_max_items(mut self, max: usize) -> Self {
        self.max_items = Some(max);
        self
    }

    fn limit<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        match self.max_items {
            Some(max) => &items[..max.min(items.len())],
            None => items,
        }
    }
}

/// Renders a sequence of analysis results.
///
/// # Examples
///
/// ```rust
/// use lawkit_core::core::AnalysisResult;
/// use lawkit_core::formatters::ResultFormatter;
///
/// struct CountFormatter;
///
/// impl ResultFormatter for CountFormatter {
///     fn format(&self, results: &[AnalysisResult]) -> lawkit_core::Result<String> {
///         Ok(format!("{} results", results.len()))
///     }
/// }
///
/// assert_eq!(CountFormatter.format(&[]).unwrap(), "0 results");
/// ```
pub trait ResultFormatter {
    fn format(&self, results: &[AnalysisResult]) -> Result<String>;

    /// Formats with explicit configuration; the default ignores it.
    fn format_with_config(
        &self,
        results: &[AnalysisResult],
        _config: &FormatterConfig,
    ) -> Result<String> {
        self.format(results)
    }
}

/// Formats results as a JSON array of `{"type", "data"}` objects.
#[derive(Debug, Clone)]
pub struct JsonFormatter {
    config: FormatterConfig,
    pretty: bool,
}

impl JsonFormatter {
    pub fn new() -> Self {
        Self::with_config(FormatterConfig::default())
    }

    pub fn with_config(config: FormatterConfig) -> Self {
        Self {
            config,
            pretty: true,
        }
    }

    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }
}

impl Default for JsonFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultFormatter for JsonFormatter {
    fn format(&self, results: &[AnalysisResult]) -> Result<String> {
        self.format_with_config(results, &self.config)
    }

    fn format_with_config(
        &self,
        results: &[AnalysisResult],
        config: &FormatterConfig,
    ) -> Result<String> {
        let mut value = serde_json::to_value(results)?;
        if let Value::Array(entries) = &mut value {
            for entry in entries {
                if let Some(Value::Object(data)) = entry.get_mut("data") {
                    data.retain(|key, _| {
                        let detail = !config.show_details && DETAIL_FIELDS.contains(&key.as_str());
                        let hidden = !config.show_recommendations && key == "recommendations";
                        !(detail || hidden)
                    });
                }
            }
        }

        let rendered = if self.pretty {
            serde_json::to_string_pretty(&value)
        } else {
            serde_json::to_string(&value)
        };
        rendered.map_err(|e| {
            LawkitError::Serialization(format!("Failed to serialize results to JSON: {e}"))
        })
    }
}

/// Formats results for terminals and logs.
#[derive(Debug, Clone, Default)]
pub struct HumanFormatter {
    config: FormatterConfig,
}

impl HumanFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: FormatterConfig) -> Self {
        Self { config }
    }

    fn render(
        &self,
        out: &mut String,
        results: &[AnalysisResult],
        config: &FormatterConfig,
    ) -> fmt::Result {
        for (i, result) in results.iter().enumerate() {
            if i > 0 {
                writeln!(out)?;
            }
            match result.risk_level() {
                Some(level) => writeln!(
                    out,
                    "{} [{}]  risk: {}",
                    result.kind(),
                    result.path(),
                    paint(level, config.use_colors)
                )?,
                None => writeln!(out, "{} [{}]", result.kind(), result.path())?,
            }
            if let Some(summary) = result.analysis_summary() {
                writeln!(out, "  {summary}")?;
            }
            for (name, value) in metrics(result) {
                writeln!(out, "  {name:<24} {value}")?;
            }
            for section in sections(result, config) {
                writeln!(out, "  {}:", section.title)?;
                for line in &section.lines {
                    writeln!(out, "    {line}")?;
                }
                if section.hidden > 0 {
                    writeln!(out, "    ... and {} more", section.hidden)?;
                }
            }
        }
        Ok(())
    }
}

impl ResultFormatter for HumanFormatter {
    fn format(&self, results: &[AnalysisResult]) -> Result<String> {
        self.format_with_config(results, &self.config)
    }

    fn format_with_config(
        &self,
        results: &[AnalysisResult],
        config: &FormatterConfig,
    ) -> Result<String> {
        let mut output = String::new();
        self.render(&mut output, results, config)
            .map_err(|e| LawkitError::Internal(format!("Failed to render results: {e}")))?;
        Ok(output)
    }
}

/// Formats results as Markdown, one section per result.
#[derive(Debug, Clone)]
pub struct MarkdownFormatter {
    config: FormatterConfig,
    heading_level: u8,
}

impl MarkdownFormatter {
    pub fn new() -> Self {
        Self::with_config(FormatterConfig::default())
    }

    pub fn with_config(config: FormatterConfig) -> Self {
        Self {
            config,
            heading_level: 2,
        }
    }

    /// Sets the heading level of each result section.
    pub fn with_heading_level(mut self, level: u8) -> Self {
        self.heading_level = level.clamp(1, 5);
        self
    }

    fn render(
        &self,
        out: &mut String,
        results: &[AnalysisResult],
        config: &FormatterConfig,
    ) -> fmt::Result {
        let h = "#".repeat(self.heading_level as usize);
        for result in results {
            writeln!(out, "{h} {} `{}`", result.kind(), result.path())?;
            writeln!(out)?;
            if let Some(level) = result.risk_level() {
                writeln!(out, "**Risk:** {level}")?;
                writeln!(out)?;
            }
            if let Some(summary) = result.analysis_summary() {
                writeln!(out, "{summary}")?;
                writeln!(out)?;
            }

            let rows = metrics(result);
            if !rows.is_empty() {
                writeln!(out, "| Metric | Value |")?;
                writeln!(out, "|--------|-------|")?;
                for (name, value) in rows {
                    writeln!(out, "| {name} | {value} |")?;
                }
                writeln!(out)?;
            }

            for section in sections(result, config) {
                writeln!(out, "{h}# {}", section.title)?;
                writeln!(out)?;
                for line in &section.lines {
                    writeln!(out, "- {line}")?;
                }
                if section.hidden > 0 {
                    writeln!(out, "- *... and {} more*", section.hidden)?;
                }
                writeln!(out)?;
            }
        }
        Ok(())
    }
}

impl Default for MarkdownFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultFormatter for MarkdownFormatter {
    fn format(&self, results: &[AnalysisResult]) -> Result<String> {
        self.format_with_config(results, &self.config)
    }

    fn format_with_config(
        &self,
        results: &[AnalysisResult],
        config: &FormatterConfig,
    ) -> Result<String> {
        let mut output = String::new();
        self.render(&mut output, results, config)
            .map_err(|e| LawkitError::Internal(format!("Failed to render results: {e}")))?;
        Ok(output)
    }
}

/// Returns the formatter for an output format.
pub fn formatter_for(format: OutputFormat) -> Box<dyn ResultFormatter + Send + Sync> {
    match format {
        OutputFormat::Text => Box::new(HumanFormatter::new()),
        OutputFormat::Json => Box::new(JsonFormatter::new()),
        OutputFormat::Markdown => Box::new(MarkdownFormatter::new()),
    }
}

/// Renders results with the format and visibility settings of a request.
pub fn format_results(results: &[AnalysisResult], options: &OutputOptions) -> Result<String> {
    formatter_for(options.format).format_with_config(results, &FormatterConfig::from_options(options))
}

fn paint(level: RiskLevel, use_colors: bool) -> String {
    if !use_colors {
        return level.to_string();
    }
    let code = match level {
        RiskLevel::Low => 32,
        RiskLevel::Medium => 33,
        RiskLevel::High => 31,
    };
    format!("\x1b[{code}m{level}\x1b[0m")
}

/// Headline metrics of a result, shown regardless of `show_details`.
fn metrics(result: &AnalysisResult) -> Vec<(&'static str, String)> {
    match result {
        AnalysisResult::BenfordAnalysis(d) => vec![
            ("Digits", format!("{} (base {})", d.digit_scheme, d.base)),
            ("Chi-square", format!("{:.3} ({} dof)", d.chi_square, d.degrees_of_freedom)),
            ("p-value", format!("{:.4}", d.p_value)),
            ("MAD", format!("{:.4} ({})", d.mad, d.conformity)),
            ("Numbers analyzed", d.total_numbers.to_string()),
        ],
        AnalysisResult::ParetoAnalysis(d) => vec![
            (
                "Top contribution",
                format!("{:.1}% from top {:.0}%", d.top_20_percent_contribution, d.top_fraction * 100.0),
            ),
            ("Pareto ratio", format!("{:.3}", d.pareto_ratio)),
            ("Concentration (Gini)", format!("{:.3}", d.concentration_index)),
            ("Items", d.total_items.to_string()),
            ("Total value", format!("{:.2}", d.total_value)),
        ],
        AnalysisResult::ZipfAnalysis(d) => vec![
            ("Zipf exponent", format!("{:.3}", d.zipf_coefficient)),
            ("Correlation", format!("{:.3}", d.correlation_coefficient)),
            ("Deviation (RMS)", format!("{:.3}", d.deviation_score)),
            ("Items", d.total_items.to_string()),
            ("Excluded (<= 0)", d.excluded_items.to_string()),
        ],
        AnalysisResult::NormalAnalysis(d) => vec![
            ("Mean", format!("{:.4}", d.mean)),
            ("Std deviation", format!("{:.4}", d.std_dev)),
            ("Skewness", format!("{:.3}", d.skewness)),
            ("Excess kurtosis", format!("{:.3}", d.kurtosis)),
            ("Jarque-Bera", format!("{:.3} (p = {:.4})", d.jarque_bera, d.normality_test_p)),
            ("Range", format!("{} .. {}", d.min, d.max)),
            ("Outliers (|z| > 3)", d.outlier_count.to_string()),
            ("Numbers analyzed", d.total_numbers.to_string()),
        ],
        AnalysisResult::PoissonAnalysis(d) => vec![
            ("Lambda", format!("{:.4}", d.lambda)),
            ("Variance/mean", format!("{:.3}", d.variance_ratio)),
            ("Dispersion test", format!("{:.3} (p = {:.4})", d.dispersion_statistic, d.poisson_test_p)),
            (
                "Zero counts",
                format!(
                    "{:.1}% observed, {:.1}% expected",
                    d.observed_zero_fraction * 100.0,
                    d.expected_zero_fraction * 100.0
                ),
            ),
            ("Max count", d.max_count.to_string()),
            ("Observations", d.total_observations.to_string()),
            ("Events", d.total_events.to_string()),
        ],
        AnalysisResult::ValidationResult(d) => vec![
            ("Passed", d.validation_passed.to_string()),
            ("Quality score", format!("{:.2}", d.data_quality_score)),
            ("Checks", format!("{}/{}", d.checks_passed, d.checks_run)),
            ("Numbers analyzed", d.total_numbers.to_string()),
        ],
        AnalysisResult::DiagnosticResult(d) => vec![
            ("Diagnostic", d.diagnostic_type.clone()),
            ("Confidence", format!("{:.3}", d.confidence_level)),
            ("Outliers", d.outlier_indices.len().to_string()),
            ("Numbers analyzed", d.total_numbers.to_string()),
        ],
        AnalysisResult::GeneratedData(d) => {
            let mut rows = vec![("Law", d.data_type.to_string()), ("Count", d.count.to_string())];
            if let Some(seed) = d.seed {
                rows.push(("Seed", seed.to_string()));
            }
            let parameters: Vec<String> =
                d.parameters.iter().map(|(k, v)| format!("{k}={v}")).collect();
            if !parameters.is_empty() {
                rows.push(("Parameters", parameters.join(", ")));
            }
            rows
        }
        AnalysisResult::IntegrationAnalysis(d) => vec![
            ("Overall risk", d.overall_risk.to_string()),
            ("Datasets", d.datasets_analyzed.join(", ")),
            (
                "Laws analyzed",
                d.laws_analyzed.iter().map(|l| l.as_str()).collect::<Vec<_>>().join(", "),
            ),
            ("Skipped", d.skipped.len().to_string()),
        ],
    }
}

struct Section {
    title: &'static str,
    lines: Vec<String>,
    hidden: usize,
}

impl Section {
    fn new(title: &'static str, all: Vec<String>, config: &FormatterConfig) -> Option<Self> {
        if all.is_empty() {
            return None;
        }
        let shown = config.limit(&all).to_vec();
        Some(Self {
            title,
            hidden: all.len() - shown.len(),
            lines: shown,
        })
    }
}

/// Detail lists of a result, filtered by the configuration.
fn sections(result: &AnalysisResult, config: &FormatterConfig) -> Vec<Section> {
    let mut sections = Vec::new();
    if let AnalysisResult::IntegrationAnalysis(d) = result {
        if config.show_recommendations {
            sections.extend(Section::new("Recommendations", d.recommendations.clone(), config));
        }
    }
    if !config.show_details {
        return sections;
    }

    match result {
        AnalysisResult::BenfordAnalysis(d) => {
            let rows = d
                .observed_distribution
                .iter()
                .zip(&d.expected_distribution)
                .enumerate()
                .map(|(i, (observed, expected))| {
                    format!(
                        "{:>4}: observed {:>6.2}%  expected {:>6.2}%",
                        d.digit_scheme.bin_value(i, d.base),
                        observed * 100.0,
                        expected * 100.0
                    )
                })
                .collect();
            sections.extend(Section::new("Digit distribution", rows, config));
        }
        AnalysisResult::ParetoAnalysis(d) => {
            let rows = d.top_items.iter().map(|v| v.to_string()).collect();
            sections.extend(Section::new("Top items", rows, config));
        }
        AnalysisResult::ValidationResult(d) => {
            sections.extend(Section::new("Issues", d.issues_found.clone(), config));
        }
        AnalysisResult::DiagnosticResult(d) => {
            sections.extend(Section::new("Findings", d.findings.clone(), config));
        }
        AnalysisResult::GeneratedData(d) => {
            let preview: Vec<String> = d
                .sample_data
                .iter()
                .take(SAMPLE_PREVIEW)
                .map(|v| v.to_string())
                .collect();
            if let Some(mut section) = Section::new("Sample", preview, config) {
                section.hidden += d.sample_data.len().saturating_sub(SAMPLE_PREVIEW);
                sections.push(section);
            }
        }
        AnalysisResult::IntegrationAnalysis(d) => {
            let skipped = d
                .skipped
                .iter()
                .map(|s| format!("{} / {}: {}", s.path, s.law, s.reason))
                .collect();
            sections.extend(Section::new("Skipped", skipped, config));
            sections.extend(Section::new("Conflicts", d.conflicting_results.clone(), config));
        }
        AnalysisResult::ZipfAnalysis(_)
        | AnalysisResult::NormalAnalysis(_)
        | AnalysisResult::PoissonAnalysis(_) => {}
    }
    sections
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::result::{IntegrationData, ParetoData};
    use crate::laws::Law;

    fn pareto() -> AnalysisResult {
        AnalysisResult::ParetoAnalysis(ParetoData {
            path: "sales".to_string(),
            top_20_percent_contribution: 84.0,
            pareto_ratio: 1.05,
            concentration_index: 0.61,
            top_fraction: 0.2,
            top_item_count: 2,
            top_items: vec![900.0, 850.0, 20.0],
            total_items: 10,
            total_value: 2130.0,
            risk_level: RiskLevel::Low,
            analysis_summary: "Top 20% of items hold 84.0% of the total".to_string(),
        })
    }

    fn integration() -> AnalysisResult {
        AnalysisResult::IntegrationAnalysis(IntegrationData {
            path: "integration".to_string(),
            laws_analyzed: vec![Law::Pareto],
            datasets_analyzed: vec!["sales".to_string()],
            overall_risk: RiskLevel::Low,
            skipped: vec![],
            conflicting_results: vec![],
            recommendations: vec!["continue routine monitoring".to_string()],
            analysis_summary: "1 analyses across 1 dataset(s)".to_string(),
        })
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("md".parse::<OutputFormat>().unwrap(), OutputFormat::Markdown);
        assert!(matches!(
            "yaml".parse::<OutputFormat>(),
            Err(LawkitError::InvalidOption { .. })
        ));
    }

    #[test]
    fn test_json_formatter_round_trips_and_hides_details() {
        let results = vec![pareto(), integration()];
        let full = JsonFormatter::new().format(&results).unwrap();
        let parsed: Vec<AnalysisResult> = serde_json::from_str(&full).unwrap();
        assert_eq!(parsed, results);

        let config = FormatterConfig::default()
            .with_details(false)
            .with_recommendations(false);
        let compact = JsonFormatter::new()
            .with_pretty(false)
            .format_with_config(&results, &config)
            .unwrap();
        let value: Value = serde_json::from_str(&compact).unwrap();
        assert!(value[0]["data"].get("top_items").is_none());
        assert!(value[1]["data"].get("recommendations").is_none());
        assert_eq!(value[0]["type"], "ParetoAnalysis");
    }

    #[test]
    fn test_human_formatter() {
        let output = HumanFormatter::new().format(&[pareto(), integration()]).unwrap();
        assert!(output.contains("ParetoAnalysis [sales]  risk: LOW"));
        assert!(output.contains("Top items:"));
        assert!(output.contains("Recommendations:"));

        let limited = HumanFormatter::with_config(FormatterConfig::default().with_max_items(1))
            .format(&[pareto()])
            .unwrap();
        assert!(limited.contains("... and 2 more"));

        let minimal = HumanFormatter::new()
            .format_with_config(&[pareto(), integration()], &FormatterConfig::minimal())
            .unwrap();
        assert!(!minimal.contains("Top items"));
        assert!(!minimal.contains("Recommendations"));
    }

    #[test]
    fn test_colors() {
        let output = HumanFormatter::with_config(FormatterConfig::default().with_colors(true))
            .format(&[pareto()])
            .unwrap();
        assert!(output.contains("\x1b[32mLOW\x1b[0m"));
    }

    #[test]
    fn test_markdown_formatter() {
        let output = MarkdownFormatter::new()
            .with_heading_level(3)
            .format(&[pareto()])
            .unwrap();
        assert!(output.starts_with("### ParetoAnalysis `sales`"));
        assert!(output.contains("| Pareto ratio | 1.050 |"));
        assert!(output.contains("#### Top items"));
    }

    #[test]
    fn test_format_results_uses_options() {
        let options = OutputOptions {
            format: OutputFormat::Json,
            show_details: false,
            show_recommendations: true,
        };
        let output = format_results(&[pareto()], &options).unwrap();
        assert!(output.trim_start().starts_with('['));
        assert!(!output.contains("top_items"));
    }
}
