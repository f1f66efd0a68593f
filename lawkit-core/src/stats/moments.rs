//! Mergeable running moments.
//!
//! Values are folded in with the one-pass update and partial accumulators are
//! combined with the pairwise formulas of Chan et al. / Pébay, so a dataset
//! split into chunks yields the same moments as a single pass up to
//! floating-point rounding. Chunk boundaries are fixed by the execution plan,
//! which keeps the rounding itself reproducible.
//!
//! Accumulators are kept in units of a power-of-two `scale` no smaller than
//! the largest magnitude seen, so powers of deviations stay bounded for any
//! finite input. Dividing by a power of two is exact, which leaves results for
//! ordinary magnitudes unchanged.

use serde::{Deserialize, Serialize};

/// Largest scale exponent; `2^1024` is not a finite f64.
const MAX_SCALE_EXPONENT: i32 = 1023;

/// Count, mean and central moment sums up to the fourth order, plus extrema.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Moments {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    scale: f64,
    /// mean of x / scale
    mean: f64,
    /// Σ (x/scale - mean)², and likewise for the third and fourth powers
    m2: f64,
    m3: f64,
    m4: f64,
    /// Σ x / scale
    sum: f64,
}

impl Default for Moments {
    fn default() -> Self {
        Self {
            count: 0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            scale: 1.0,
            mean: 0.0,
            m2: 0.0,
            m3: 0.0,
            m4: 0.0,
            sum: 0.0,
        }
    }
}

fn scale_for(magnitude: f64) -> f64 {
    let exponent = (magnitude.log2().ceil() as i32).min(MAX_SCALE_EXPONENT);
    let scale = 2f64.powi(exponent);
    if scale < magnitude && exponent < MAX_SCALE_EXPONENT {
        scale * 2.0
    } else {
        scale
    }
}

impl Moments {
    /// Accumulates a slice in order.
    pub fn from_values(values: &[f64]) -> Self {
        let mut moments = Self::default();
        for &value in values {
            moments.push(value);
        }
        moments
    }

    /// Re-expresses the accumulators in a larger scale.
    fn rescaled(&self, scale: f64) -> Self {
        if scale <= self.scale {
            return *self;
        }
        let r = scale / self.scale;
        Self {
            scale,
            mean: self.mean / r,
            m2: self.m2 / r / r,
            m3: self.m3 / r / r / r,
            m4: self.m4 / r / r / r / r,
            sum: self.sum / r,
            ..*self
        }
    }

    /// Folds one value in.
    pub fn push(&mut self, value: f64) {
        if value.abs() > self.scale {
            *self = self.rescaled(scale_for(value.abs()));
        }
        let x = value / self.scale;

        let n1 = self.count as f64;
        self.count += 1;
        let n = self.count as f64;
        let delta = x - self.mean;
        let delta_n = delta / n;
        let delta_n2 = delta_n * delta_n;
        let term1 = delta * delta_n * n1;

        self.mean += delta_n;
        self.m4 += term1 * delta_n2 * (n * n - 3.0 * n + 3.0) + 6.0 * delta_n2 * self.m2
            - 4.0 * delta_n * self.m3;
        self.m3 += term1 * delta_n * (n - 2.0) - 3.0 * delta_n * self.m2;
        self.m2 += term1;
        self.sum += x;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    /// Combines two accumulators as if their values had been pushed in sequence.
    pub fn merge(&self, other: &Self) -> Self {
        if self.count == 0 {
            return *other;
        }
        if other.count == 0 {
            return *self;
        }

        let scale = self.scale.max(other.scale);
        let a = self.rescaled(scale);
        let b = other.rescaled(scale);

        let na = a.count as f64;
        let nb = b.count as f64;
        let n = na + nb;
        let delta = b.mean - a.mean;
        let delta2 = delta * delta;
        let delta3 = delta2 * delta;
        let delta4 = delta2 * delta2;

        let mean = a.mean + delta * nb / n;
        let m2 = a.m2 + b.m2 + delta2 * na * nb / n;
        let m3 = a.m3
            + b.m3
            + delta3 * na * nb * (na - nb) / (n * n)
            + 3.0 * delta * (na * b.m2 - nb * a.m2) / n;
        let m4 = a.m4
            + b.m4
            + delta4 * na * nb * (na * na - na * nb + nb * nb) / (n * n * n)
            + 6.0 * delta2 * (na * na * b.m2 + nb * nb * a.m2) / (n * n)
            + 4.0 * delta * (na * b.m3 - nb * a.m3) / n;

        Self {
            count: a.count + b.count,
            min: a.min.min(b.min),
            max: a.max.max(b.max),
            scale,
            mean,
            m2,
            m3,
            m4,
            sum: a.sum + b.sum,
        }
    }

    pub fn mean(&self) -> f64 {
        self.mean * self.scale
    }

    /// Sum of the values; saturates to infinity past `f64::MAX`.
    pub fn sum(&self) -> f64 {
        self.sum * self.scale
    }

    /// Whether every value seen is the same.
    pub fn is_constant(&self) -> bool {
        self.count > 0 && self.min == self.max
    }

    fn scaled_variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            (self.m2 / (self.count as f64 - 1.0)).max(0.0)
        }
    }

    /// Sample variance with Bessel's correction; zero below two values.
    pub fn sample_variance(&self) -> f64 {
        self.scaled_variance() * self.scale * self.scale
    }

    pub fn sample_std_dev(&self) -> f64 {
        self.scaled_variance().sqrt() * self.scale
    }

    /// Sample variance over the mean, or `None` when the mean is not positive.
    pub fn variance_to_mean(&self) -> Option<f64> {
        (self.mean > 0.0).then(|| self.scaled_variance() / self.mean * self.scale)
    }

    /// Population skewness `g1 = m3 / m2^1.5`.
    pub fn skewness(&self) -> f64 {
        let n = self.count as f64;
        if self.count == 0 || self.m2 <= 0.0 {
            return 0.0;
        }
        let m2 = self.m2 / n;
        let m3 = self.m3 / n;
        m3 / m2.powf(1.5)
    }

    /// Population excess kurtosis `g2 = m4 / m2² - 3`.
    pub fn excess_kurtosis(&self) -> f64 {
        let n = self.count as f64;
        if self.count == 0 || self.m2 <= 0.0 {
            return 0.0;
        }
        let m2 = self.m2 / n;
        let m4 = self.m4 / n;
        m4 / (m2 * m2) - 3.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9 * expected.abs().max(1.0),
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_basic_moments() {
        let moments = Moments::from_values(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert_eq!(moments.count, 8);
        assert_close(moments.mean(), 5.0);
        assert_close(moments.sample_variance(), 32.0 / 7.0);
        assert_close(moments.variance_to_mean().unwrap(), 32.0 / 35.0);
        assert_eq!(moments.min, 2.0);
        assert_eq!(moments.max, 9.0);
        assert_close(moments.sum(), 40.0);
        assert!(!moments.is_constant());
    }

    #[test]
    fn test_symmetric_data_has_no_skew() {
        let moments = Moments::from_values(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_close(moments.skewness(), 0.0);
        // uniform-like data is platykurtic
        assert!(moments.excess_kurtosis() < 0.0);
    }

    #[test]
    fn test_merge_matches_single_pass() {
        let values: Vec<f64> = (1..=40).map(|i| (i as f64).powf(1.3) - 7.0).collect();
        let whole = Moments::from_values(&values);
        let merged = values
            .chunks(7)
            .map(Moments::from_values)
            .fold(Moments::default(), |acc, chunk| acc.merge(&chunk));

        assert_eq!(merged.count, whole.count);
        assert_close(merged.mean(), whole.mean());
        assert_close(merged.sample_variance(), whole.sample_variance());
        assert_close(merged.skewness(), whole.skewness());
        assert_close(merged.excess_kurtosis(), whole.excess_kurtosis());
        assert_eq!(merged.min, whole.min);
        assert_eq!(merged.max, whole.max);
    }

    #[test]
    fn test_merge_with_empty() {
        let moments = Moments::from_values(&[1.0, 3.0]);
        assert_eq!(Moments::default().merge(&moments), moments);
        assert_eq!(moments.merge(&Moments::default()), moments);
    }

    #[test]
    fn test_huge_magnitudes_stay_finite() {
        let moments = Moments::from_values(&[1e300, 0.0, 2.0, 5.0]);
        assert_close(moments.mean() / 2.5e299, 1.0);
        assert_close(moments.sample_std_dev() / 5e299, 1.0);
        assert!(moments.sample_variance().is_infinite());
        assert_close(moments.variance_to_mean().unwrap() / 1e300, 1.0);
        assert!(moments.skewness().is_finite() && moments.skewness() > 1.0);
        assert!(moments.excess_kurtosis().is_finite());

        let extreme = Moments::from_values(&[f64::MAX, -f64::MAX, 0.0]);
        assert_eq!(extreme.mean(), 0.0);
        assert!(extreme.sample_std_dev().is_infinite() || extreme.sample_std_dev() > 1e308);
    }

    #[test]
    fn test_merge_across_scales() {
        let small = Moments::from_values(&[1.0, 2.0, 3.0]);
        let large = Moments::from_values(&[4e200, 6e200]);
        let merged = small.merge(&large);
        let whole = Moments::from_values(&[1.0, 2.0, 3.0, 4e200, 6e200]);
        assert_eq!(merged.count, 5);
        assert_close(merged.mean() / whole.mean(), 1.0);
        assert_close(merged.sample_std_dev() / whole.sample_std_dev(), 1.0);
        assert_eq!(merged.max, 6e200);
    }

    #[test]
    fn test_constant_detection() {
        assert!(Moments::from_values(&[4.0, 4.0, 4.0]).is_constant());
        assert!(!Moments::default().is_constant());
        assert_eq!(Moments::from_values(&[0.0, 0.0]).variance_to_mean(), None);
    }
}
