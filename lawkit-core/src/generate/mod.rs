//! Synthetic data generation.
//!
//! A generation payload names the law and optionally the sample size, seed and
//! law parameters:
//!
//! ```json
//! {"type": "normal", "count": 500, "seed": 7, "mean": 50.0, "std_dev": 10.0}
//! ```
//!
//! Parameters may also be nested under `"parameters"`. Values in the payload
//! win over the `generate_*` options, which win over the built-in defaults.

pub mod sampler;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::{Map, Value};
use tracing::{debug, instrument};

use crate::core::options::GenerationOptions;
use crate::core::result::GeneratedData;
use crate::error::{LawkitError, Result};
use crate::laws::Law;

pub const DEFAULT_COUNT: usize = 1_000;
pub const MAX_COUNT: usize = 10_000_000;
pub const GENERATED_LABEL: &str = "generated";

/// Powers of the base spanned by the default Benford range.
pub const BENFORD_DEFAULT_DIGITS: i32 = 6;

/// Largest Poisson mean; counts up to it stay exact in an f64.
pub const MAX_POISSON_LAMBDA: f64 = 1e15;

/// Resolved request for one generated dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationConfig {
    pub law: Law,
    pub count: usize,
    pub seed: Option<u64>,
    /// Law parameters as supplied, before defaults are applied
    pub parameters: Map<String, Value>,
}

impl GenerationConfig {
    pub fn new(law: Law, count: usize) -> Self {
        Self {
            law,
            count,
            seed: None,
            parameters: Map::new(),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_parameter(mut self, key: &str, value: f64) -> Self {
        self.parameters.insert(key.to_string(), Value::from(value));
        self
    }

    /// Reads a generation payload, falling back to the `generate_*` options.
    pub fn from_payload(payload: &Value, options: &GenerationOptions) -> Result<Self> {
        let map = match payload {
            Value::String(name) => {
                return Self::resolve(name.parse()?, None, None, Map::new(), options);
            }
            Value::Object(map) => map,
            _ => {
                return Err(LawkitError::invalid_option(
                    "type",
                    "generation payload must be an object naming the law",
                ))
            }
        };

        let law_name = map
            .get("type")
            .or_else(|| map.get("law"))
            .and_then(Value::as_str)
            .ok_or_else(|| {
                LawkitError::invalid_option("type", "generation payload needs a 'type' or 'law'")
            })?;
        let law: Law = law_name
            .parse()
            .map_err(|_| LawkitError::invalid_option("type", format!("unknown law '{law_name}'")))?;

        let count = payload_u64(map, "count")?
            .map(|c| usize::try_from(c).unwrap_or(usize::MAX));
        let seed = payload_u64(map, "seed")?;

        let mut parameters = Map::new();
        for (key, value) in map {
            if !matches!(key.as_str(), "type" | "law" | "count" | "seed" | "parameters") {
                parameters.insert(key.clone(), value.clone());
            }
        }
        if let Some(nested) = map.get("parameters") {
            let nested = nested.as_object().ok_or_else(|| {
                LawkitError::invalid_option("parameters", "expected an object")
            })?;
            for (key, value) in nested {
                parameters.insert(key.clone(), value.clone());
            }
        }

        Self::resolve(law, count, seed, parameters, options)
    }

    fn resolve(
        law: Law,
        count: Option<usize>,
        seed: Option<u64>,
        parameters: Map<String, Value>,
        options: &GenerationOptions,
    ) -> Result<Self> {
        let count = count.or(options.count).unwrap_or(DEFAULT_COUNT);
        if count == 0 || count > MAX_COUNT {
            return Err(LawkitError::invalid_option(
                "count",
                format!("must be between 1 and {MAX_COUNT}, got {count}"),
            ));
        }
        Ok(Self {
            law,
            count,
            seed: seed.or(options.seed),
            parameters,
        })
    }

    fn param(&self, keys: &[&str]) -> Result<Option<f64>> {
        for key in keys {
            match self.parameters.get(*key) {
                None | Some(Value::Null) => continue,
                Some(Value::Number(n)) => {
                    return n
                        .as_f64()
                        .filter(|v| v.is_finite())
                        .map(Some)
                        .ok_or_else(|| LawkitError::invalid_option(*key, "expected a finite number"))
                }
                Some(Value::String(s)) => {
                    return s
                        .trim()
                        .parse::<f64>()
                        .ok()
                        .filter(|v| v.is_finite())
                        .map(Some)
                        .ok_or_else(|| {
                            LawkitError::invalid_option(*key, format!("expected a number, got '{s}'"))
                        })
                }
                Some(_) => return Err(LawkitError::invalid_option(*key, "expected a number")),
            }
        }
        Ok(None)
    }

    fn positive_param(&self, keys: &[&str], default: f64) -> Result<f64> {
        let value = self.param(keys)?.unwrap_or(default);
        if value > 0.0 {
            Ok(value)
        } else {
            Err(LawkitError::invalid_option(
                keys[0],
                format!("must be positive, got {value}"),
            ))
        }
    }
}

fn payload_u64(map: &Map<String, Value>, key: &str) -> Result<Option<u64>> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n.as_u64().map(Some).ok_or_else(|| {
            LawkitError::invalid_option(key, format!("expected a non-negative integer, got {n}"))
        }),
        Some(Value::String(s)) => s.trim().parse::<u64>().map(Some).map_err(|_| {
            LawkitError::invalid_option(key, format!("expected a non-negative integer, got '{s}'"))
        }),
        Some(_) => Err(LawkitError::invalid_option(
            key,
            "expected a non-negative integer",
        )),
    }
}

/// Produces synthetic datasets that follow a chosen law.
#[derive(Debug, Clone, Default)]
pub struct Generator {
    options: GenerationOptions,
}

impl Generator {
    pub fn new(options: GenerationOptions) -> Self {
        Self { options }
    }

    #[instrument(skip(self, config), fields(law = %config.law, count = config.count, seeded = config.seed.is_some()))]
    pub fn generate(&self, config: &GenerationConfig) -> Result<GeneratedData> {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let mut resolved = Map::new();
        let count = config.count;

        let sample_data = match config.law {
            Law::Benford => {
                let base = config.param(&["base"])?.unwrap_or(10.0);
                if base.fract() != 0.0 || !(3.0..=36.0).contains(&base) {
                    return Err(LawkitError::invalid_option(
                        "base",
                        format!("must be an integer in 3..=36, got {base}"),
                    ));
                }
                // Log-uniform data follows Benford in a base only over whole
                // powers of it, so the default range is [1, base^6].
                let default_max = base.powi(BENFORD_DEFAULT_DIGITS);
                let min = self.benford_bound(config, &["min_value", "min"], self.options.range_min, 1.0)?;
                let max =
                    self.benford_bound(config, &["max_value", "max"], self.options.range_max, default_max)?;
                if min >= max {
                    return Err(LawkitError::invalid_option(
                        "min_value",
                        format!("must be below max_value ({min} >= {max})"),
                    ));
                }
                resolved.insert("min_value".into(), Value::from(min));
                resolved.insert("max_value".into(), Value::from(max));
                resolved.insert("base".into(), Value::from(base as u64));
                sampler::benford_stratified(&mut rng, count, min, max)
            }
            Law::Pareto => {
                let alpha = config.positive_param(&["alpha", "shape"], 1.16)?;
                let scale = config.positive_param(&["scale", "x_min"], 1.0)?;
                resolved.insert("alpha".into(), Value::from(alpha));
                resolved.insert("scale".into(), Value::from(scale));
                (0..count)
                    .map(|_| sampler::sample_pareto(&mut rng, scale, alpha))
                    .collect()
            }
            Law::Zipf => {
                let exponent = config.positive_param(&["exponent", "s"], 1.0)?;
                let scale = config.positive_param(&["scale"], 1_000.0)?;
                resolved.insert("exponent".into(), Value::from(exponent));
                resolved.insert("scale".into(), Value::from(scale));
                (1..=count)
                    .map(|rank| scale / (rank as f64).powf(exponent))
                    .collect()
            }
            Law::Normal => {
                let mean = config.param(&["mean", "mu"])?.unwrap_or(0.0);
                let std_dev = config.positive_param(&["std_dev", "stddev", "sigma"], 1.0)?;
                let bounds = (self.options.range_min, self.options.range_max);
                resolved.insert("mean".into(), Value::from(mean));
                resolved.insert("std_dev".into(), Value::from(std_dev));
                if let Some(min) = bounds.0 {
                    resolved.insert("range_min".into(), Value::from(min));
                }
                if let Some(max) = bounds.1 {
                    resolved.insert("range_max".into(), Value::from(max));
                }
                (0..count)
                    .map(|_| sampler::sample_normal(&mut rng, mean, std_dev, bounds))
                    .collect()
            }
            Law::Poisson => {
                let lambda = config.positive_param(&["lambda", "rate"], 5.0)?;
                if lambda > MAX_POISSON_LAMBDA {
                    return Err(LawkitError::invalid_option(
                        "lambda",
                        format!("must be at most {MAX_POISSON_LAMBDA:e}, got {lambda}"),
                    ));
                }
                resolved.insert("lambda".into(), Value::from(lambda));
                (0..count)
                    .map(|_| sampler::sample_poisson(&mut rng, lambda) as f64)
                    .collect()
            }
        };

        debug!(generated = count, "Generated synthetic data");

        Ok(GeneratedData {
            path: GENERATED_LABEL.to_string(),
            data_type: config.law,
            count,
            seed: config.seed,
            parameters: resolved,
            sample_data,
        })
    }

    fn benford_bound(
        &self,
        config: &GenerationConfig,
        keys: &[&str],
        option: Option<f64>,
        default: f64,
    ) -> Result<f64> {
        let value = config.param(keys)?.or(option).unwrap_or(default);
        if value > 0.0 {
            Ok(value)
        } else {
            Err(LawkitError::invalid_option(
                keys[0],
                format!("Benford generation needs a positive range, got {value}"),
            ))
        }
    }
}
