//! Robust anomaly diagnostics.
//!
//! Outliers are flagged with the Iglewicz–Hoaglin modified z-score, which uses
//! the median and the median absolute deviation and is therefore not dragged
//! around by the outliers it is looking for.

use std::collections::HashMap;
use tracing::{debug, instrument};

use crate::core::options::LawkitOptions;
use crate::core::result::DiagnosticData;
use crate::input::NumericDataset;
use crate::stats::median;

/// Scales the MAD to the standard deviation of a normal distribution.
pub const MAD_SCALE: f64 = 0.6745;

/// Same role as [`MAD_SCALE`] when the mean absolute deviation is used.
pub const MEAN_AD_SCALE: f64 = 1.253_314;

/// |M| above which a value is an outlier.
pub const MODIFIED_Z_CUTOFF: f64 = 3.5;

/// Sample size at which diagnostic confidence stops growing.
pub const FULL_CONFIDENCE_SAMPLE: f64 = 30.0;

pub const DIAGNOSTIC_TYPE: &str = "General";

/// A value flagged by the modified z-score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Outlier {
    pub index: usize,
    pub value: f64,
    pub score: f64,
}

/// Modified z-scores of every value, `None` when the spread is zero.
pub fn modified_z_scores(values: &[f64]) -> Option<Vec<f64>> {
    let center = median(values)?;
    let deviations: Vec<f64> = values.iter().map(|v| (v - center).abs()).collect();
    let mad = median(&deviations)?;

    let scale = if mad > 0.0 {
        mad / MAD_SCALE
    } else {
        let mean_ad = deviations.iter().sum::<f64>() / deviations.len() as f64;
        if mean_ad <= 0.0 {
            return None;
        }
        mean_ad * MEAN_AD_SCALE
    };

    Some(values.iter().map(|v| (v - center) / scale).collect())
}

/// Values whose modified z-score exceeds the cutoff, in input order.
pub fn find_outliers(values: &[f64]) -> Vec<Outlier> {
    modified_z_scores(values)
        .map(|scores| {
            scores
                .into_iter()
                .enumerate()
                .filter(|(_, score)| score.abs() > MODIFIED_Z_CUTOFF)
                .map(|(index, score)| Outlier {
                    index,
                    value: values[index],
                    score,
                })
                .collect()
        })
        .unwrap_or_default()
}

#[derive(Debug, Clone)]
pub struct Diagnostician {
    confidence_level: f64,
    outlier_detection: bool,
}

impl Diagnostician {
    pub fn new(confidence_level: f64, outlier_detection: bool) -> Self {
        Self {
            confidence_level,
            outlier_detection,
        }
    }

    pub fn from_options(options: &LawkitOptions) -> Self {
        Self::new(
            options.risk.confidence_level,
            options.validation.enable_outlier_detection,
        )
    }

    #[instrument(skip(self, dataset), fields(dataset = %dataset.label, values = dataset.len()))]
    pub fn diagnose(&self, dataset: &NumericDataset) -> DiagnosticData {
        let values = &dataset.values;
        let n = values.len();
        let mut findings = Vec::new();

        let outliers = if self.outlier_detection {
            find_outliers(values)
        } else {
            Vec::new()
        };
        for outlier in &outliers {
            let direction = if outlier.score > 0.0 { "above" } else { "below" };
            findings.push(format!(
                "Outlier at index {}: value {} lies far {} the median (modified z-score {:.2})",
                outlier.index, outlier.value, direction, outlier.score
            ));
        }

        if let Some((value, count)) = dominant_value(values) {
            findings.push(format!(
                "Repeated value {} accounts for {} of {} values ({:.1}%)",
                value,
                count,
                n,
                count as f64 / n as f64 * 100.0
            ));
        }

        let confidence_level =
            (self.confidence_level * (n as f64 / FULL_CONFIDENCE_SAMPLE).min(1.0)).clamp(0.0, 1.0);
        debug!(findings = findings.len(), confidence_level, "Diagnostics complete");

        let analysis_summary = if findings.is_empty() {
            format!("No anomalies detected in {n} values")
        } else {
            format!(
                "{} anomalies detected in {} values ({} outliers)",
                findings.len(),
                n,
                outliers.len()
            )
        };

        DiagnosticData {
            path: dataset.label.clone(),
            diagnostic_type: DIAGNOSTIC_TYPE.to_string(),
            findings,
            outlier_indices: outliers.iter().map(|o| o.index).collect(),
            confidence_level,
            total_numbers: n,
            analysis_summary,
        }
    }
}

/// The most frequent value when it makes up more than half of the data.
fn dominant_value(values: &[f64]) -> Option<(f64, usize)> {
    let mut counts: HashMap<u64, (f64, usize)> = HashMap::new();
    for &value in values {
        let key = if value == 0.0 { 0 } else { value.to_bits() };
        counts.entry(key).or_insert((value, 0)).1 += 1;
    }
    counts
        .into_values()
        .max_by(|a, b| a.1.cmp(&b.1).then(b.0.total_cmp(&a.0)))
        .filter(|&(_, count)| count * 2 > values.len())
}
