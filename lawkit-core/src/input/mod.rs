//! Input normalization.
//!
//! Turns an arbitrary JSON payload into labeled numeric datasets. This module
//! owns the "what counts as a number" policy; analyzers only ever see finite
//! `f64` values.
//!
//! ## Shapes
//!
//! | Payload | Datasets |
//! |---------|----------|
//! | `[1, 2, "3"]` | `default` |
//! | `{"sales": [..], "costs": [..]}` | `sales`, `costs` |
//! | `{"q1": {"north": [..]}}` | `q1.north` |
//! | `{"a": 1, "b": 2}` | `default` (scalar leaves of the root mapping) |
//! | `42` | `default` |

pub mod numerals;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, instrument};

use crate::core::options::InputOptions;
use crate::error::{LawkitError, Result};

pub use numerals::parse_number;

/// Label used for unnamed data.
pub const DEFAULT_LABEL: &str = "default";

/// Label of a dataset pooled from several groups.
pub const COMBINED_LABEL: &str = "combined";

/// An ordered sequence of finite numbers with a label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericDataset {
    pub label: String,
    pub values: Vec<f64>,
}

impl NumericDataset {
    pub fn new(label: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            label: label.into(),
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Concatenates datasets in order. A single dataset keeps its label.
    pub fn pool(datasets: Vec<NumericDataset>) -> Option<NumericDataset> {
        match datasets.len() {
            0 => None,
            1 => datasets.into_iter().next(),
            _ => {
                let values = datasets.into_iter().flat_map(|d| d.values).collect();
                Some(NumericDataset::new(COMBINED_LABEL, values))
            }
        }
    }
}

/// Recursive-descent normalizer over JSON payloads.
#[derive(Debug)]
pub struct Normalizer<'a> {
    options: &'a InputOptions,
    skipped_leaves: usize,
}

impl<'a> Normalizer<'a> {
    pub fn new(options: &'a InputOptions) -> Self {
        Self {
            options,
            skipped_leaves: 0,
        }
    }

    /// Extracts every non-empty dataset in declaration order.
    ///
    /// Fails with [`LawkitError::NoValidNumbers`] when nothing numeric
    /// survives, including when `path_filter` removes every dataset.
    #[instrument(skip(self, payload))]
    pub fn normalize(mut self, payload: &Value) -> Result<Vec<NumericDataset>> {
        let mut datasets = Vec::new();
        match payload {
            Value::Null => return Err(LawkitError::NoValidNumbers),
            Value::Object(map) => self.collect_mapping(map, None, &mut datasets),
            Value::Array(_) => {
                let mut values = Vec::new();
                self.flatten(payload, &mut values);
                datasets.push(NumericDataset::new(DEFAULT_LABEL, values));
            }
            scalar => {
                let values = self.leaf(scalar).into_iter().collect();
                datasets.push(NumericDataset::new(DEFAULT_LABEL, values));
            }
        }

        if self.skipped_leaves > 0 {
            debug!(
                skipped = self.skipped_leaves,
                "Dropped non-numeric leaves during normalization"
            );
        }

        let before_filter = datasets.len();
        datasets.retain(|dataset| {
            if dataset.is_empty() {
                debug!(label = %dataset.label, "Dropping dataset without numeric values");
                return false;
            }
            self.options
                .path_filter
                .as_ref()
                .map_or(true, |pattern| pattern.matches(&dataset.label))
        });
        debug!(
            datasets = datasets.len(),
            filtered = before_filter - datasets.len(),
            "Normalized payload"
        );

        if datasets.is_empty() {
            return Err(LawkitError::NoValidNumbers);
        }
        Ok(datasets)
    }

    fn collect_mapping(
        &mut self,
        map: &Map<String, Value>,
        path: Option<&str>,
        out: &mut Vec<NumericDataset>,
    ) {
        // Scalar leaves of this mapping form one dataset, placed where the
        // first of them was declared.
        let mut own_slot: Option<usize> = None;

        for (key, value) in map {
            if self.is_ignored(key) {
                debug!(key = %key, "Skipping ignored key");
                continue;
            }
            let child_path = match path {
                Some(prefix) => format!("{prefix}.{key}"),
                None => key.clone(),
            };
            match value {
                Value::Array(_) => {
                    let mut values = Vec::new();
                    self.flatten(value, &mut values);
                    out.push(NumericDataset::new(child_path, values));
                }
                Value::Object(inner) => self.collect_mapping(inner, Some(&child_path), out),
                scalar => {
                    if let Some(number) = self.leaf(scalar) {
                        let slot = *own_slot.get_or_insert_with(|| {
                            out.push(NumericDataset::new(
                                path.unwrap_or(DEFAULT_LABEL),
                                Vec::new(),
                            ));
                            out.len() - 1
                        });
                        out[slot].values.push(number);
                    }
                }
            }
        }
    }

    fn flatten(&mut self, value: &Value, out: &mut Vec<f64>) {
        match value {
            Value::Array(items) => {
                for item in items {
                    self.flatten(item, out);
                }
            }
            Value::Object(map) => {
                for (key, item) in map {
                    if self.is_ignored(key) {
                        continue;
                    }
                    self.flatten(item, out);
                }
            }
            scalar => {
                if let Some(number) = self.leaf(scalar) {
                    out.push(number);
                }
            }
        }
    }

    fn leaf(&mut self, value: &Value) -> Option<f64> {
        let number = match value {
            Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
            Value::String(s) => parse_number(s, self.options.international_numerals),
            _ => None,
        };
        if number.is_none() {
            self.skipped_leaves += 1;
        }
        number
    }

    fn is_ignored(&self, key: &str) -> bool {
        self.options
            .ignore_keys
            .as_ref()
            .is_some_and(|regex| regex.is_match(key))
    }
}

/// Normalizes a payload with the given input policy.
pub fn normalize(payload: &Value, options: &InputOptions) -> Result<Vec<NumericDataset>> {
    Normalizer::new(options).normalize(payload)
}
