//! Differential-privacy noise mechanisms.
//!
//! Laplace via inverse-CDF sampling, Gaussian via Box–Muller, both scaled
//! by sensitivity/epsilon and clamped to the field's declared bounds. The
//! noised copy is what leaves the pipeline; raw analyzer output never does.

use rand::Rng;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mechanism {
    Laplace,
    Gaussian,
}

/// Declared bounds a noised value is clamped to.
#[derive(Clone, Copy, Debug)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

impl Bounds {
    pub fn clamp(&self, v: f64) -> f64 {
        v.clamp(self.min, self.max)
    }
}

/// One Laplace sample with scale `b`: inverse CDF of a uniform draw.
pub fn sample_laplace(rng: &mut impl Rng, b: f64) -> f64 {
    // u uniform in (-0.5, 0.5]; the open end avoids ln(0).
    let u: f64 = rng.r#gen::<f64>() - 0.5;
    let u = if u == -0.5 { -0.499_999_999 } else { u };
    -b * u.signum() * (1.0 - 2.0 * u.abs()).ln()
}

/// One Gaussian sample with standard deviation `sigma` (Box–Muller).
pub fn sample_gaussian(rng: &mut impl Rng, sigma: f64) -> f64 {
    let u1: f64 = rng.r#gen::<f64>().max(f64::MIN_POSITIVE);
    let u2: f64 = rng.r#gen::<f64>();
    sigma * (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

/// Add mechanism noise scaled by sensitivity/epsilon, clamped to bounds.
pub fn noised(
    rng: &mut impl Rng,
    mechanism: Mechanism,
    value: f64,
    sensitivity: f64,
    epsilon: f64,
    bounds: Bounds,
) -> f64 {
    debug_assert!(epsilon > 0.0);
    let scale = sensitivity / epsilon;
    let noise = match mechanism {
        Mechanism::Laplace => sample_laplace(rng, scale),
        Mechanism::Gaussian => sample_gaussian(rng, scale),
    };
    bounds.clamp(value + noise)
}

/// Convenience for integer metrics: noise, clamp, round back to u64.
pub fn noised_u64(
    rng: &mut impl Rng,
    mechanism: Mechanism,
    value: u64,
    sensitivity: f64,
    epsilon: f64,
    bounds: Bounds,
) -> u64 {
    noised(rng, mechanism, value as f64, sensitivity, epsilon, bounds).round() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    const WIDE: Bounds = Bounds { min: -1e12, max: 1e12 };

    #[test]
    fn laplace_mean_converges_to_true_value() {
        let mut rng = ChaCha20Rng::from_seed([7u8; 32]);
        let n = 200_000;
        let true_value = 1000.0;
        let sum: f64 = (0..n)
            .map(|_| noised(&mut rng, Mechanism::Laplace, true_value, 5.0, 0.5, WIDE))
            .sum();
        let mean = sum / n as f64;
        assert!((mean - true_value).abs() < 1.0, "mean drifted to {mean}");
    }

    #[test]
    fn laplace_variance_is_two_scale_squared() {
        let mut rng = ChaCha20Rng::from_seed([9u8; 32]);
        let n = 200_000;
        let (sensitivity, epsilon) = (5.0, 0.5);
        let b = sensitivity / epsilon; // 10
        let samples: Vec<f64> = (0..n).map(|_| sample_laplace(&mut rng, b)).collect();
        let mean = samples.iter().sum::<f64>() / n as f64;
        let variance =
            samples.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n as f64;
        let expected = 2.0 * b * b; // 200
        assert!(
            (variance - expected).abs() / expected < 0.05,
            "variance {variance} vs expected {expected}"
        );
    }

    #[test]
    fn gaussian_variance_matches_sigma() {
        let mut rng = ChaCha20Rng::from_seed([11u8; 32]);
        let n = 200_000;
        let sigma = 4.0;
        let samples: Vec<f64> = (0..n).map(|_| sample_gaussian(&mut rng, sigma)).collect();
        let mean = samples.iter().sum::<f64>() / n as f64;
        let variance =
            samples.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n as f64;
        assert!((variance - sigma * sigma).abs() / (sigma * sigma) < 0.05);
    }

    #[test]
    fn clamping_respects_declared_bounds() {
        let mut rng = ChaCha20Rng::from_seed([13u8; 32]);
        let bounds = Bounds { min: 0.0, max: 100.0 };
        for _ in 0..1000 {
            let v = noised(&mut rng, Mechanism::Laplace, 50.0, 10.0, 0.1, bounds);
            assert!((0.0..=100.0).contains(&v));
        }
    }

    #[test]
    fn smaller_epsilon_means_more_noise() {
        let spread = |epsilon: f64| {
            let mut rng = ChaCha20Rng::from_seed([17u8; 32]);
            (0..10_000)
                .map(|_| (noised(&mut rng, Mechanism::Laplace, 0.0, 1.0, epsilon, WIDE)).abs())
                .sum::<f64>()
        };
        assert!(spread(0.1) > spread(10.0) * 10.0);
    }
}
