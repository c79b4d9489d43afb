//! Two-parameter Weibull maximum-likelihood fitting.

use crate::error::{Result, WindError};
use crate::utils::optimization::newton_bisect;
use serde::{Deserialize, Serialize};
use statrs::distribution::{Continuous, ContinuousCDF, Weibull};
use statrs::function::gamma::gamma;
use tracing::debug;

/// Lower end of the shape bracket.
pub const MIN_SHAPE: f64 = 1e-3;

/// Upper end of the shape bracket. Samples with (near) zero spread saturate here.
pub const MAX_SHAPE: f64 = 100.0;

const SHAPE_TOLERANCE: f64 = 1e-10;
const MAX_ITERATIONS: usize = 200;

/// How exact-zero wind speeds are treated before fitting.
///
/// The Weibull density is zero at the origin, so calm hours cannot enter the
/// likelihood as they are.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZeroPolicy {
    /// Exclude zero speeds and report how many were excluded.
    #[default]
    Drop,
    /// Replace zero speeds by the given positive epsilon.
    Floor(f64),
}

/// Positive values ready for fitting.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedSample {
    pub values: Vec<f64>,
    /// Zero speeds removed under [`ZeroPolicy::Drop`].
    pub zeros_excluded: usize,
    /// Zero speeds replaced under [`ZeroPolicy::Floor`].
    pub zeros_floored: usize,
    /// NaN entries skipped.
    pub missing: usize,
}

/// Apply the zero policy and reject negative speeds.
pub fn prepare_sample(values: &[f64], policy: ZeroPolicy) -> Result<PreparedSample> {
    if let ZeroPolicy::Floor(eps) = policy {
        if !(eps.is_finite() && eps > 0.0) {
            return Err(WindError::InvalidParameter(format!(
                "zero floor must be a positive number, got {eps}"
            )));
        }
    }

    let mut prepared = PreparedSample {
        values: Vec::with_capacity(values.len()),
        zeros_excluded: 0,
        zeros_floored: 0,
        missing: 0,
    };

    for (i, &v) in values.iter().enumerate() {
        if v.is_nan() {
            prepared.missing += 1;
        } else if v < 0.0 || v.is_infinite() {
            return Err(WindError::Data {
                line: i + 1,
                message: format!("wind speed {v} is not a finite non-negative number"),
            });
        } else if v == 0.0 {
            match policy {
                ZeroPolicy::Drop => prepared.zeros_excluded += 1,
                ZeroPolicy::Floor(eps) => {
                    prepared.zeros_floored += 1;
                    prepared.values.push(eps);
                }
            }
        } else {
            prepared.values.push(v);
        }
    }

    Ok(prepared)
}

/// A fitted two-parameter Weibull distribution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WeibullFit {
    /// Shape `k`.
    pub shape: f64,
    /// Scale `λ`, in the units of the data.
    pub scale: f64,
    pub log_likelihood: f64,
    pub aic: f64,
    /// Number of values in the fit.
    pub n: usize,
    /// Zero speeds excluded before fitting.
    pub zeros_excluded: usize,
    /// True when the shape hit [`MAX_SHAPE`] because the sample has no spread.
    pub saturated: bool,
}

impl WeibullFit {
    /// Mean `λ Γ(1 + 1/k)`.
    pub fn mean(&self) -> f64 {
        self.scale * gamma(1.0 + 1.0 / self.shape)
    }

    /// Quantile `λ (−ln(1 − p))^{1/k}`.
    pub fn quantile(&self, p: f64) -> f64 {
        if p <= 0.0 {
            return 0.0;
        }
        if p >= 1.0 {
            return f64::INFINITY;
        }
        self.scale * (-(1.0 - p).ln()).powf(1.0 / self.shape)
    }

    /// Cumulative distribution function.
    pub fn cdf(&self, x: f64) -> f64 {
        if x <= 0.0 {
            0.0
        } else {
            -(-(x / self.scale).powf(self.shape)).exp_m1()
        }
    }

    /// The fitted distribution as a `statrs` object.
    pub fn distribution(&self) -> Result<Weibull> {
        Weibull::new(self.shape, self.scale).map_err(|_| {
            WindError::InvalidParameter(format!(
                "invalid Weibull parameters shape={} scale={}",
                self.shape, self.scale
            ))
        })
    }

    /// Probability density at each point of `grid`.
    pub fn pdf_on(&self, grid: &[f64]) -> Result<Vec<f64>> {
        let dist = self.distribution()?;
        Ok(grid.iter().map(|&x| if x < 0.0 { 0.0 } else { dist.pdf(x) }).collect())
    }

    /// Mass in `[a, b)`.
    pub fn probability_between(&self, a: f64, b: f64) -> Result<f64> {
        let dist = self.distribution()?;
        Ok(dist.cdf(b.max(0.0)) - dist.cdf(a.max(0.0)))
    }
}

/// Log-likelihood of positive `values` under Weibull(shape, scale).
pub fn weibull_log_likelihood(values: &[f64], shape: f64, scale: f64) -> f64 {
    let n = values.len() as f64;
    let sum_ln: f64 = values.iter().map(|x| x.ln()).sum();
    let sum_pow: f64 = values.iter().map(|x| (x / scale).powf(shape)).sum();
    n * shape.ln() - n * shape * scale.ln() + (shape - 1.0) * sum_ln - sum_pow
}

/// Akaike information criterion.
pub fn aic(log_likelihood: f64, parameters: usize) -> f64 {
    2.0 * parameters as f64 - 2.0 * log_likelihood
}

/// Maximum-likelihood Weibull fit.
///
/// `target` names the fit in errors and logs (`"annual"`, a season name, ...).
///
/// The shape solves the profile score equation
/// `Σ x^k ln x / Σ x^k − 1/k − mean(ln x) = 0`, which is increasing in `k`.
/// Powers are taken of `x / max(x)` so that large shapes do not overflow.
///
/// # Example
/// ```
/// use wind_resource::distribution::{fit_weibull, ZeroPolicy};
///
/// let speeds = [3.1, 5.4, 7.2, 4.8, 6.1, 2.9, 8.3, 5.0];
/// let fit = fit_weibull(&speeds, ZeroPolicy::Drop, "example").unwrap();
/// assert!(fit.shape > 0.0 && fit.scale > 0.0);
/// ```
pub fn fit_weibull(values: &[f64], policy: ZeroPolicy, target: &str) -> Result<WeibullFit> {
    let sample = prepare_sample(values, policy)?;
    let x = &sample.values;
    let n = x.len();

    if n < 2 {
        return Err(WindError::fit(
            target,
            format!("need at least 2 positive wind speeds, got {n}"),
        ));
    }

    let x_max = x.iter().cloned().fold(f64::MIN, f64::max);
    let ln_x: Vec<f64> = x.iter().map(|v| v.ln()).collect();
    let ln_y: Vec<f64> = ln_x.iter().map(|l| l - x_max.ln()).collect();
    let mean_ln_y = ln_y.iter().sum::<f64>() / n as f64;

    // Profile score in terms of y = x / max(x); ln(max) cancels.
    let score = |k: f64| -> (f64, f64) {
        let mut s0 = 0.0;
        let mut s1 = 0.0;
        let mut s2 = 0.0;
        for &l in &ln_y {
            let w = (k * l).exp();
            s0 += w;
            s1 += w * l;
            s2 += w * l * l;
        }
        let ratio = s1 / s0;
        let value = ratio - 1.0 / k - mean_ln_y;
        let slope = s2 / s0 - ratio * ratio + 1.0 / (k * k);
        (value, slope)
    };

    let (shape, saturated) = if score(MAX_SHAPE).0 < 0.0 {
        (MAX_SHAPE, true)
    } else {
        let result = newton_bisect(
            score,
            (MIN_SHAPE, MAX_SHAPE),
            moment_shape_guess(x),
            SHAPE_TOLERANCE,
            MAX_ITERATIONS,
        );
        if !result.converged {
            return Err(WindError::fit(
                target,
                format!("shape iteration did not converge after {} steps", result.iterations),
            ));
        }
        debug!(target_fit = target, iterations = result.iterations, "weibull shape converged");
        (result.root, false)
    };

    let mean_pow = ln_y.iter().map(|l| (shape * l).exp()).sum::<f64>() / n as f64;
    let scale = x_max * mean_pow.powf(1.0 / shape);
    let log_likelihood = weibull_log_likelihood(x, shape, scale);

    if !(shape.is_finite() && shape > 0.0 && scale.is_finite() && scale > 0.0)
        || !log_likelihood.is_finite()
    {
        return Err(WindError::fit(
            target,
            format!("non-finite estimate shape={shape} scale={scale} loglik={log_likelihood}"),
        ));
    }

    Ok(WeibullFit {
        shape,
        scale,
        log_likelihood,
        aic: aic(log_likelihood, 2),
        n,
        zeros_excluded: sample.zeros_excluded,
        saturated,
    })
}

/// Justus' moment approximation `k ≈ (σ/μ)^−1.086`, used as a starting point.
fn moment_shape_guess(x: &[f64]) -> f64 {
    let n = x.len() as f64;
    let mean = x.iter().sum::<f64>() / n;
    let var = x.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let cv = var.sqrt() / mean;
    if cv.is_finite() && cv > 0.0 {
        cv.powf(-1.086).clamp(0.1, 50.0)
    } else {
        2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rand_distr::Distribution;

    fn weibull_sample(scale: f64, shape: f64, n: usize, seed: u64) -> Vec<f64> {
        let dist = rand_distr::Weibull::new(scale, shape).unwrap();
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n).map(|_| dist.sample(&mut rng)).collect()
    }

    #[test]
    fn recovers_known_parameters() {
        let data = weibull_sample(7.0, 2.0, 5000, 42);
        let fit = fit_weibull(&data, ZeroPolicy::Drop, "synthetic").unwrap();

        assert_relative_eq!(fit.shape, 2.0, epsilon = 0.1);
        assert_relative_eq!(fit.scale, 7.0, epsilon = 0.25);
        assert_eq!(fit.n, 5000);
        assert!(!fit.saturated);
        assert_relative_eq!(fit.aic, 4.0 - 2.0 * fit.log_likelihood, epsilon = 1e-9);
    }

    #[test]
    fn estimate_is_a_likelihood_maximum() {
        let data = weibull_sample(5.0, 1.6, 800, 7);
        let fit = fit_weibull(&data, ZeroPolicy::Drop, "synthetic").unwrap();
        let ll = fit.log_likelihood;

        for (dk, dl) in [(0.02, 0.0), (-0.02, 0.0), (0.0, 0.05), (0.0, -0.05)] {
            let other = weibull_log_likelihood(&data, fit.shape + dk, fit.scale + dl);
            assert!(other < ll, "perturbation ({dk}, {dl}) improved the likelihood");
        }
    }

    #[test]
    fn identical_values_saturate_with_scale_at_the_value() {
        let fit = fit_weibull(&[6.5; 50], ZeroPolicy::Drop, "constant").unwrap();

        assert!(fit.shape.is_finite() && fit.shape > 0.0);
        assert_eq!(fit.shape, MAX_SHAPE);
        assert!(fit.saturated);
        assert_relative_eq!(fit.scale, 6.5, epsilon = 1e-9);
        assert!(fit.log_likelihood.is_finite());
    }

    #[test]
    fn large_speeds_do_not_overflow() {
        let data: Vec<f64> = weibull_sample(7.0, 3.0, 500, 3)
            .into_iter()
            .map(|v| v * 1e3)
            .collect();
        let fit = fit_weibull(&data, ZeroPolicy::Drop, "scaled").unwrap();
        assert_relative_eq!(fit.scale / 1e3, 7.0, epsilon = 0.5);
    }

    #[test]
    fn zero_policy_drop_counts_excluded() {
        let data = [0.0, 3.0, 4.0, 0.0, 5.5, 6.0, f64::NAN];
        let fit = fit_weibull(&data, ZeroPolicy::Drop, "calm").unwrap();
        assert_eq!(fit.n, 4);
        assert_eq!(fit.zeros_excluded, 2);
    }

    #[test]
    fn zero_policy_floor_keeps_hours() {
        let data = [0.0, 3.0, 4.0, 0.0, 5.5, 6.0];
        let fit = fit_weibull(&data, ZeroPolicy::Floor(0.1), "calm").unwrap();
        assert_eq!(fit.n, 6);
        assert_eq!(fit.zeros_excluded, 0);
    }

    #[test]
    fn invalid_floor_is_rejected() {
        let err = prepare_sample(&[1.0], ZeroPolicy::Floor(0.0)).unwrap_err();
        assert!(matches!(err, WindError::InvalidParameter(_)));
    }

    #[test]
    fn negative_speed_is_a_data_error() {
        let err = fit_weibull(&[3.0, -1.0, 4.0], ZeroPolicy::Drop, "bad").unwrap_err();
        assert!(matches!(err, WindError::Data { line: 2, .. }));
    }

    #[test]
    fn too_few_values_name_the_target() {
        let err = fit_weibull(&[0.0, 4.0], ZeroPolicy::Drop, "Winter").unwrap_err();
        match err {
            WindError::Fit { target, .. } => assert_eq!(target, "Winter"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn distribution_helpers_agree() {
        let fit = WeibullFit {
            shape: 2.0,
            scale: 7.0,
            log_likelihood: 0.0,
            aic: 4.0,
            n: 10,
            zeros_excluded: 0,
            saturated: false,
        };

        let median = fit.quantile(0.5);
        assert_relative_eq!(fit.cdf(median), 0.5, epsilon = 1e-12);
        assert_relative_eq!(fit.mean(), 7.0 * gamma(1.5), epsilon = 1e-12);
        assert_relative_eq!(fit.probability_between(0.0, median).unwrap(), 0.5, epsilon = 1e-9);

        let pdf = fit.pdf_on(&[-1.0, 0.0, 5.0]).unwrap();
        assert_eq!(pdf[0], 0.0);
        let expected = (2.0 / 7.0) * (5.0_f64 / 7.0) * (-(5.0_f64 / 7.0).powi(2)).exp();
        assert_relative_eq!(pdf[2], expected, epsilon = 1e-12);
    }

    #[test]
    fn aic_formula() {
        assert_relative_eq!(aic(-100.0, 2), 204.0);
        assert_relative_eq!(aic(-100.0, 8), 216.0);
    }
}
