//! Variate samplers used by the generator.
//!
//! All samplers take any `Rng` so a seeded `StdRng` reproduces the same
//! sequence on every run.

use rand::seq::SliceRandom;
use rand::Rng;
use std::f64::consts::PI;

/// Largest Poisson mean sampled in one Knuth pass; bigger means are split.
pub const POISSON_PIECE: f64 = 30.0;

/// Mean above which Poisson draws use the normal approximation.
pub const POISSON_NORMAL_THRESHOLD: f64 = 1_000.0;

/// Uniform draw in (0, 1].
fn open_unit<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    1.0 - rng.random::<f64>()
}

/// One N(0, 1) draw via Box–Muller.
pub fn sample_standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    let u1 = open_unit(rng);
    let u2: f64 = rng.random::<f64>();
    let r = (-2.0 * u1.ln()).sqrt();
    r * (2.0 * PI * u2).cos()
}

/// N(mean, std_dev) draw, optionally bounded.
///
/// Out-of-range draws are resampled a bounded number of times and the last
/// draw is clamped, so a narrow range far from the mean still terminates.
pub fn sample_normal<R: Rng + ?Sized>(
    rng: &mut R,
    mean: f64,
    std_dev: f64,
    bounds: (Option<f64>, Option<f64>),
) -> f64 {
    const MAX_RESAMPLES: usize = 100;
    let (low, high) = bounds;
    let in_range = |x: f64| low.map_or(true, |l| x >= l) && high.map_or(true, |h| x <= h);

    let mut draw = mean + std_dev * sample_standard_normal(rng);
    for _ in 0..MAX_RESAMPLES {
        if in_range(draw) {
            return draw;
        }
        draw = mean + std_dev * sample_standard_normal(rng);
    }
    let draw = low.map_or(draw, |l| draw.max(l));
    high.map_or(draw, |h| draw.min(h))
}

/// Pareto(scale, alpha) draw by inverse CDF.
pub fn sample_pareto<R: Rng + ?Sized>(rng: &mut R, scale: f64, alpha: f64) -> f64 {
    scale / open_unit(rng).powf(1.0 / alpha)
}

/// Poisson(lambda) draw with Knuth's multiplication method.
///
/// Means above [`POISSON_PIECE`] are split into pieces whose draws are
/// summed, which keeps `e^-lambda` away from underflow. Above
/// [`POISSON_NORMAL_THRESHOLD`] the rounded normal approximation
/// `N(lambda, lambda)` is used instead, so a draw costs O(1).
pub fn sample_poisson<R: Rng + ?Sized>(rng: &mut R, lambda: f64) -> u64 {
    if lambda > POISSON_NORMAL_THRESHOLD {
        let draw = lambda + lambda.sqrt() * sample_standard_normal(rng);
        return draw.round().max(0.0) as u64;
    }

    let mut remaining = lambda;
    let mut total = 0;
    while remaining > 0.0 {
        let piece = remaining.min(POISSON_PIECE);
        remaining -= piece;
        total += knuth_poisson(rng, piece);
    }
    total
}

fn knuth_poisson<R: Rng + ?Sized>(rng: &mut R, lambda: f64) -> u64 {
    let limit = (-lambda).exp();
    let mut product = rng.random::<f64>();
    let mut count = 0;
    while product > limit {
        count += 1;
        product *= rng.random::<f64>();
    }
    count
}

/// `count` log-uniform values over `[min, max]`, one per stratum, shuffled.
///
/// Stratifying the logarithm keeps the leading-digit histogram within one
/// count of Benford's law at any sample size when the range spans whole
/// powers of the base.
pub fn benford_stratified<R: Rng + ?Sized>(
    rng: &mut R,
    count: usize,
    min: f64,
    max: f64,
) -> Vec<f64> {
    let log_min = min.ln();
    let log_span = max.ln() - log_min;
    let mut values: Vec<f64> = (0..count)
        .map(|i| {
            let u = (i as f64 + rng.random::<f64>()) / count as f64;
            (log_min + u * log_span).exp().clamp(min, max)
        })
        .collect();
    values.shuffle(rng);
    values
}
