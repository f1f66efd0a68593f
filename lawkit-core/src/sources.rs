//! Payload ingestion from files and strings.
//!
//! Sources only turn text into a JSON payload; deciding which leaves are
//! numbers stays with the [`input`](crate::input) normalizer. Delimited text
//! is read as follows:
//!
//! - rows are lines; cells are separated by `,`, `;` or tabs, one delimiter
//!   per document, and may be double-quoted
//! - a first row of two or more non-numeric cells is a header, and each
//!   column becomes a named group
//! - cells that cannot be read as a number under any numeral policy are
//!   skipped
//!
//! # Examples
//!
//! ```rust
//! use lawkit_core::sources::parse_delimited;
//! use serde_json::json;
//!
//! assert_eq!(parse_delimited("1\n2.5\nn/a\n4").unwrap(), json!([1.0, 2.5, 4.0]));
//! assert_eq!(
//!     parse_delimited("east,west\n1,2\n3,4").unwrap(),
//!     json!({"east": [1.0, 3.0], "west": [2.0, 4.0]})
//! );
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, instrument};

use crate::core::result::AnalysisResult;
use crate::error::{ErrorContext, LawkitError, Result};
use crate::input::parse_number;
use crate::logging::{truncate_field, MAX_FIELD_LENGTH};

/// How a piece of text is to be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataFormat {
    Json,
    /// CSV, TSV or one value per line
    Delimited,
    /// JSON when it parses, delimited text otherwise
    #[default]
    Auto,
}

impl DataFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataFormat::Json => "json",
            DataFormat::Delimited => "delimited",
            DataFormat::Auto => "auto",
        }
    }

    /// Picks the format from a file extension.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("json") => DataFormat::Json,
            Some("csv" | "tsv" | "txt") => DataFormat::Delimited,
            _ => DataFormat::Auto,
        }
    }
}

impl fmt::Display for DataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataFormat {
    type Err = LawkitError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(DataFormat::Json),
            "csv" | "tsv" | "txt" | "text" | "delimited" => Ok(DataFormat::Delimited),
            "auto" => Ok(DataFormat::Auto),
            other => Err(LawkitError::invalid_option(
                "format",
                format!("expected json, csv, text or auto, got '{other}'"),
            )),
        }
    }
}

/// Parses a JSON document.
pub fn parse_json(content: &str) -> Result<Value> {
    serde_json::from_str(content).map_err(|e| LawkitError::Parse(format!("Invalid JSON: {e}")))
}

/// Parses delimited text into an array, or a mapping of columns when the
/// first row is a header.
///
/// The delimiter is whichever of `,`, `;` or tab occurs most often outside
/// quotes on the first non-blank line. Quoted cells keep embedded delimiters.
pub fn parse_delimited(content: &str) -> Result<Value> {
    let delimiter = sniff_delimiter(content);
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let mut rows: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| LawkitError::Parse(format!("Invalid delimited text: {e}")))?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        rows.push(record.iter().map(str::to_string).collect());
    }

    let header = rows.first().filter(|row| {
        row.len() > 1
            && row
                .iter()
                .all(|cell| !cell.is_empty() && parse_number(cell, true).is_none())
    });

    let value = match header {
        Some(header) => {
            let mut columns: Vec<Vec<Value>> = vec![Vec::new(); header.len()];
            for row in &rows[1..] {
                for (column, cell) in columns.iter_mut().zip(row) {
                    column.extend(cell_value(cell));
                }
            }
            let mut map = Map::new();
            for (name, column) in header.iter().zip(columns) {
                map.insert(name.clone(), Value::Array(column));
            }
            Value::Object(map)
        }
        None => Value::Array(
            rows.iter()
                .flat_map(|row| row.iter().filter_map(|cell| cell_value(cell)))
                .collect(),
        ),
    };
    Ok(value)
}

fn sniff_delimiter(content: &str) -> u8 {
    let Some(line) = content.lines().find(|line| !line.trim().is_empty()) else {
        return b',';
    };

    let mut counts = [(b',', 0usize), (b';', 0), (b'\t', 0)];
    let mut quoted = false;
    for byte in line.bytes() {
        if byte == b'"' {
            quoted = !quoted;
        } else if !quoted {
            if let Some(entry) = counts.iter_mut().find(|(d, _)| *d == byte) {
                entry.1 += 1;
            }
        }
    }

    // First candidate wins ties.
    counts
        .iter()
        .fold((b',', 0), |best, &entry| if entry.1 > best.1 { entry } else { best })
        .0
}

// Plain decimals become JSON numbers; numerals only the international policy
// reads stay strings so the normalizer's policy still applies.
fn cell_value(cell: &str) -> Option<Value> {
    if cell.is_empty() {
        return None;
    }
    if let Some(number) = parse_number(cell, false) {
        return Some(Value::from(number));
    }
    if parse_number(cell, true).is_some() {
        return Some(Value::String(cell.to_string()));
    }
    debug!(
        cell = %truncate_field(cell, MAX_FIELD_LENGTH),
        "Skipping unparseable cell"
    );
    None
}

/// Parses text in the given format.
pub fn parse_content(content: &str, format: DataFormat) -> Result<Value> {
    match format {
        DataFormat::Json => parse_json(content),
        DataFormat::Delimited => parse_delimited(content),
        DataFormat::Auto => parse_json(content).or_else(|_| parse_delimited(content)),
    }
}

/// Reads a file, choosing the format from its extension.
pub fn load_file(path: impl AsRef<Path>) -> Result<Value> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    parse_content(&content, DataFormat::from_path(path))
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Runs a subcommand over the contents of a file.
#[instrument(skip(path, options), fields(path = %path.as_ref().display()))]
pub async fn law_from_file(
    subcommand: &str,
    path: impl AsRef<Path>,
    options: &Value,
) -> Result<Vec<AnalysisResult>> {
    let path = path.as_ref();
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let payload = parse_content(&content, DataFormat::from_path(path))
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    crate::law(subcommand, &payload, options).await
}

/// Runs a subcommand over in-memory text.
pub async fn law_from_string(
    content: &str,
    format: DataFormat,
    subcommand: &str,
    options: &Value,
) -> Result<Vec<AnalysisResult>> {
    let payload = parse_content(content, format)?;
    crate::law(subcommand, &payload, options).await
}
