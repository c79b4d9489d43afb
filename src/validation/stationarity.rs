//! Stationarity tests for time series.
//!
//! The augmented Dickey-Fuller test is reported to the analyst; KPSS drives the
//! choice of differencing order in the automated order search.

use crate::error::{Result, WindError};
use crate::utils::ols::{ols_fit, OlsFit};
use crate::utils::stats::cdf_normal;
use serde::Serialize;
use tracing::debug;

/// Result of a stationarity test.
#[derive(Debug, Clone, Serialize)]
pub struct StationarityResult {
    /// Test statistic
    pub statistic: f64,
    /// P-value (approximate)
    pub p_value: f64,
    /// Number of lags used
    pub lags: usize,
    /// Observations in the test regression
    pub nobs: usize,
    /// Whether the series appears stationary at the 5% level
    pub is_stationary: bool,
    /// Critical values at common significance levels
    pub critical_values: CriticalValues,
}

/// Critical values for stationarity tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CriticalValues {
    /// Critical value at 1% significance
    pub cv_1pct: f64,
    /// Critical value at 5% significance
    pub cv_5pct: f64,
    /// Critical value at 10% significance
    pub cv_10pct: f64,
}

/// Default ADF lag ceiling, `12 (n/100)^{1/4}`.
pub fn default_adf_max_lags(n: usize) -> usize {
    (12.0 * (n as f64 / 100.0).powf(0.25)).floor() as usize
}

/// Design of the ADF regression at `lag`, using rows from `first` onwards.
///
/// `Δy_t = α + β y_{t−1} + Σ_{i=1..lag} γ_i Δy_{t−i}`.
fn adf_regression(series: &[f64], lag: usize, first: usize) -> Result<OlsFit> {
    let diff: Vec<f64> = series.windows(2).map(|w| w[1] - w[0]).collect();
    let rows = first..diff.len();

    let y: Vec<f64> = rows.clone().map(|i| diff[i]).collect();
    let mut columns = vec![vec![1.0; y.len()], rows.clone().map(|i| series[i]).collect()];
    for j in 1..=lag {
        columns.push(rows.clone().map(|i| diff[i - j]).collect());
    }
    ols_fit(&y, &columns)
}

/// Augmented Dickey-Fuller test with a constant.
///
/// Tests the null hypothesis of a unit root; rejection implies stationarity.
/// The lag is chosen by AIC over `0..=max_lags` on a common sample, then the
/// regression is refitted on all usable rows. P-values follow MacKinnon (1994)
/// and critical values MacKinnon (2010).
pub fn adf_test(series: &[f64], max_lags: Option<usize>) -> Result<StationarityResult> {
    let n = series.len();
    if n < 10 {
        return Err(WindError::InsufficientData { needed: 10, got: n });
    }
    if series.iter().any(|v| !v.is_finite()) {
        return Err(WindError::InvalidParameter(
            "ADF test requires a series without missing values".into(),
        ));
    }

    let ceiling = (n - 1) / 2 - 2;
    let max_lags = max_lags.unwrap_or_else(|| default_adf_max_lags(n)).min(ceiling);

    let mut best: Option<(usize, f64)> = None;
    for lag in 0..=max_lags {
        let Ok(fit) = adf_regression(series, lag, max_lags) else {
            continue;
        };
        let params = fit.coefficients.len() as f64;
        let aic = -2.0 * fit.log_likelihood() + 2.0 * params;
        if best.map_or(true, |(_, b)| aic < b) {
            best = Some((lag, aic));
        }
    }
    let (lag, _) = best.ok_or_else(|| {
        WindError::InvalidParameter("ADF regression is singular at every lag".into())
    })?;

    let fit = adf_regression(series, lag, lag)?;
    let statistic = fit.t_statistic(1);
    if !statistic.is_finite() {
        return Err(WindError::InvalidParameter(
            "ADF statistic is not finite (constant series?)".into(),
        ));
    }

    let critical_values = adf_critical_values(fit.nobs);
    let p_value = mackinnon_p_value(statistic);
    debug!(statistic, p_value, lag, "augmented dickey-fuller test");

    Ok(StationarityResult {
        statistic,
        p_value,
        lags: lag,
        nobs: fit.nobs,
        is_stationary: p_value < 0.05,
        critical_values,
    })
}

/// MacKinnon (2010) finite-sample critical values, constant only.
pub fn adf_critical_values(nobs: usize) -> CriticalValues {
    let n = nobs as f64;
    let poly = |b: [f64; 4]| b[0] + b[1] / n + b[2] / (n * n) + b[3] / (n * n * n);
    CriticalValues {
        cv_1pct: poly([-3.43035, -6.5393, -16.786, -79.433]),
        cv_5pct: poly([-2.86154, -2.8903, -4.234, -40.040]),
        cv_10pct: poly([-2.56677, -1.5384, -2.809, 0.0]),
    }
}

/// MacKinnon (1994) approximate asymptotic p-value, constant only, one variable.
pub fn mackinnon_p_value(tau: f64) -> f64 {
    const TAU_MAX: f64 = 2.74;
    const TAU_MIN: f64 = -18.83;
    const TAU_STAR: f64 = -1.61;
    const SMALL: [f64; 3] = [2.1659, 1.4412, 0.038269];
    const LARGE: [f64; 4] = [1.7339, 0.93202, -0.12745, -0.010368];

    if tau.is_nan() {
        return f64::NAN;
    }
    if tau > TAU_MAX {
        return 1.0;
    }
    if tau < TAU_MIN {
        return 0.0;
    }

    let z = if tau <= TAU_STAR {
        SMALL[0] + SMALL[1] * tau + SMALL[2] * tau * tau
    } else {
        LARGE[0] + LARGE[1] * tau + LARGE[2] * tau * tau + LARGE[3] * tau * tau * tau
    };
    cdf_normal(z)
}

/// Upper-tail KPSS critical values for level stationarity, `(significance, value)`.
const KPSS_TABLE: [(f64, f64); 4] = [(0.10, 0.347), (0.05, 0.463), (0.025, 0.574), (0.01, 0.739)];

/// KPSS test for level stationarity.
///
/// Tests the null hypothesis that the series is stationary around a level;
/// rejection implies a unit root.
///
/// # Arguments
/// * `series` - Time series data
/// * `lags` - Bartlett-window lags for the long-run variance (default: `4 (n/100)^{1/4}`)
pub fn kpss_test(series: &[f64], lags: Option<usize>) -> Result<StationarityResult> {
    let n = series.len();
    if n < 4 {
        return Err(WindError::InsufficientData { needed: 4, got: n });
    }

    let lags = lags
        .unwrap_or_else(|| (4.0 * (n as f64 / 100.0).powf(0.25)).floor() as usize)
        .clamp(1, n - 1);

    let nf = n as f64;
    let mean = series.iter().sum::<f64>() / nf;
    let residuals: Vec<f64> = series.iter().map(|x| x - mean).collect();

    let mut partial = 0.0;
    let eta: f64 = residuals
        .iter()
        .map(|r| {
            partial += r;
            partial * partial
        })
        .sum::<f64>()
        / (nf * nf);

    let mut long_run = residuals.iter().map(|r| r * r).sum::<f64>() / nf;
    for j in 1..=lags {
        let weight = 1.0 - j as f64 / (lags + 1) as f64;
        let gamma: f64 = residuals[j..]
            .iter()
            .zip(&residuals)
            .map(|(a, b)| a * b)
            .sum::<f64>()
            / nf;
        long_run += 2.0 * weight * gamma;
    }

    let critical_values = CriticalValues {
        cv_1pct: 0.739,
        cv_5pct: 0.463,
        cv_10pct: 0.347,
    };

    // A constant series is trivially level-stationary.
    if long_run <= f64::EPSILON * mean.abs().max(1.0) {
        return Ok(StationarityResult {
            statistic: 0.0,
            p_value: KPSS_TABLE[0].0,
            lags,
            nobs: n,
            is_stationary: true,
            critical_values,
        });
    }

    let statistic = eta / long_run;
    let p_value = kpss_p_value(statistic);

    Ok(StationarityResult {
        statistic,
        p_value,
        lags,
        nobs: n,
        is_stationary: statistic < critical_values.cv_5pct,
        critical_values,
    })
}

/// Interpolated KPSS p-value, clamped to the tabulated range [0.01, 0.10].
fn kpss_p_value(statistic: f64) -> f64 {
    let (first_alpha, first_c) = KPSS_TABLE[0];
    let (last_alpha, last_c) = KPSS_TABLE[KPSS_TABLE.len() - 1];
    if statistic <= first_c {
        return first_alpha;
    }
    if statistic >= last_c {
        return last_alpha;
    }
    KPSS_TABLE
        .windows(2)
        .find(|w| statistic <= w[1].1)
        .map(|w| {
            let t = (statistic - w[0].1) / (w[1].1 - w[0].1);
            w[0].0 + t * (w[1].0 - w[0].0)
        })
        .unwrap_or(last_alpha)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rand_distr::{Distribution, Normal};

    fn noise(n: usize, seed: u64) -> Vec<f64> {
        let normal = Normal::new(0.0, 1.0).unwrap();
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n).map(|_| normal.sample(&mut rng)).collect()
    }

    /// Random walk with drift.
    fn random_walk(n: usize, seed: u64) -> Vec<f64> {
        let mut level = 0.0;
        noise(n, seed)
            .into_iter()
            .map(|e| {
                level += 0.2 + e;
                level
            })
            .collect()
    }

    fn ar1(phi: f64, n: usize, seed: u64) -> Vec<f64> {
        let mut prev = 0.0;
        noise(n, seed)
            .into_iter()
            .map(|e| {
                prev = phi * prev + e;
                prev + 8.0
            })
            .collect()
    }

    #[test]
    fn adf_rejects_unit_root_for_stationary_ar() {
        let result = adf_test(&ar1(0.5, 600, 1), None).unwrap();
        assert!(result.statistic < result.critical_values.cv_1pct);
        assert!(result.p_value < 0.01);
        assert!(result.is_stationary);
    }

    #[test]
    fn adf_keeps_unit_root_for_random_walk() {
        let result = adf_test(&random_walk(600, 2), None).unwrap();
        assert!(result.p_value > 0.05);
        assert!(!result.is_stationary);
    }

    #[test]
    fn adf_lag_respects_ceiling() {
        let series = ar1(0.3, 200, 3);
        let result = adf_test(&series, Some(4)).unwrap();
        assert!(result.lags <= 4);
        assert_eq!(default_adf_max_lags(100), 12);
    }

    #[test]
    fn adf_rejects_short_or_gappy_input() {
        assert!(matches!(
            adf_test(&[1.0, 2.0, 3.0], None),
            Err(WindError::InsufficientData { needed: 10, got: 3 })
        ));
        let mut gappy = ar1(0.3, 50, 4);
        gappy[10] = f64::NAN;
        assert!(adf_test(&gappy, None).is_err());
    }

    #[test]
    fn mackinnon_p_value_reference_points() {
        // Asymptotic 5% and 1% critical values map back to those levels.
        assert_relative_eq!(mackinnon_p_value(-2.8621), 0.05, epsilon = 2e-3);
        assert_relative_eq!(mackinnon_p_value(-3.4304), 0.01, epsilon = 1e-3);
        assert_eq!(mackinnon_p_value(3.0), 1.0);
        assert_eq!(mackinnon_p_value(-20.0), 0.0);
        assert!(mackinnon_p_value(-1.0) > 0.5);
    }

    #[test]
    fn mackinnon_2010_critical_values() {
        let cv = adf_critical_values(500);
        assert_relative_eq!(cv.cv_5pct, -2.86154 - 2.8903 / 500.0 - 4.234 / 250_000.0 - 40.040 / 1.25e8, epsilon = 1e-12);
        assert!(cv.cv_1pct < cv.cv_5pct && cv.cv_5pct < cv.cv_10pct);
    }

    #[test]
    fn kpss_accepts_white_noise() {
        let result = kpss_test(&noise(500, 5), None).unwrap();
        assert!(result.statistic < result.critical_values.cv_1pct);
        assert!(result.p_value > 0.01);
    }

    #[test]
    fn kpss_rejects_random_walk() {
        let result = kpss_test(&random_walk(500, 6), None).unwrap();
        assert!(!result.is_stationary);
        assert_relative_eq!(result.p_value, 0.01);
    }

    #[test]
    fn kpss_constant_series_is_stationary() {
        let result = kpss_test(&[5.0; 40], None).unwrap();
        assert!(result.is_stationary);
    }

    #[test]
    fn kpss_p_value_interpolates() {
        assert_relative_eq!(kpss_p_value(0.463), 0.05, epsilon = 1e-12);
        let mid = kpss_p_value(0.5);
        assert!(mid < 0.05 && mid > 0.025);
    }
}
