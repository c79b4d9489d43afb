//! Sample autocorrelation and partial autocorrelation functions.

use serde::Serialize;

/// Sample autocorrelations at lags `0..=max_lag`.
///
/// Uses the biased estimator (denominator `n` at every lag), which keeps the
/// sequence positive semi-definite. Lags at or beyond the series length are NaN.
/// A constant series has autocorrelation 0 at every positive lag.
pub fn acf(series: &[f64], max_lag: usize) -> Vec<f64> {
    let n = series.len();
    if n == 0 {
        return vec![f64::NAN; max_lag + 1];
    }

    let m = series.iter().sum::<f64>() / n as f64;
    let centered: Vec<f64> = series.iter().map(|x| x - m).collect();
    let c0: f64 = centered.iter().map(|x| x * x).sum();

    (0..=max_lag)
        .map(|k| {
            if k >= n {
                f64::NAN
            } else if k == 0 {
                1.0
            } else if c0 < 1e-12 {
                0.0
            } else {
                centered[k..]
                    .iter()
                    .zip(&centered)
                    .map(|(a, b)| a * b)
                    .sum::<f64>()
                    / c0
            }
        })
        .collect()
}

/// Returns the autocorrelation at a specific lag.
pub fn autocorrelation(series: &[f64], lag: usize) -> f64 {
    acf(series, lag)[lag]
}

/// Partial autocorrelations at lags `0..=max_lag` (lag 0 is 1).
///
/// Uses the Durbin-Levinson recursion on the sample autocorrelations.
pub fn pacf(series: &[f64], max_lag: usize) -> Vec<f64> {
    pacf_from_acf(&acf(series, max_lag))
}

/// Durbin-Levinson recursion from autocorrelations `rho[0..=m]`.
pub fn pacf_from_acf(rho: &[f64]) -> Vec<f64> {
    if rho.is_empty() {
        return Vec::new();
    }
    let max_lag = rho.len() - 1;
    let mut out = vec![f64::NAN; max_lag + 1];
    out[0] = 1.0;

    let mut phi: Vec<f64> = Vec::with_capacity(max_lag);
    let mut v = 1.0_f64;
    for k in 1..=max_lag {
        if !rho[k].is_finite() || v.abs() < 1e-12 {
            break;
        }
        let num = rho[k] - phi.iter().enumerate().map(|(j, p)| p * rho[k - 1 - j]).sum::<f64>();
        let a = num / v;
        let previous = phi.clone();
        for j in 0..previous.len() {
            phi[j] = previous[j] - a * previous[previous.len() - 1 - j];
        }
        phi.push(a);
        v *= 1.0 - a * a;
        out[k] = a;
    }
    out
}

/// Half-width of the approximate 95% band for a white-noise correlogram.
pub fn confidence_band(n: usize) -> f64 {
    if n == 0 {
        f64::NAN
    } else {
        1.96 / (n as f64).sqrt()
    }
}

/// ACF and PACF of one series with the white-noise band.
#[derive(Debug, Clone, Serialize)]
pub struct Correlogram {
    /// Lags `0..=max_lag`.
    pub lags: Vec<usize>,
    pub acf: Vec<f64>,
    pub pacf: Vec<f64>,
    /// ±`band` bounds the lags consistent with white noise.
    pub band: f64,
}

impl Correlogram {
    pub fn new(series: &[f64], max_lag: usize) -> Self {
        let acf = acf(series, max_lag);
        let pacf = pacf_from_acf(&acf);
        Self {
            lags: (0..=max_lag).collect(),
            acf,
            pacf,
            band: confidence_band(series.len()),
        }
    }

    /// Positive lags whose autocorrelation falls outside the band.
    pub fn significant_acf_lags(&self) -> Vec<usize> {
        significant(&self.lags, &self.acf, self.band)
    }

    /// Positive lags whose partial autocorrelation falls outside the band.
    pub fn significant_pacf_lags(&self) -> Vec<usize> {
        significant(&self.lags, &self.pacf, self.band)
    }
}

fn significant(lags: &[usize], values: &[f64], band: f64) -> Vec<usize> {
    lags.iter()
        .zip(values)
        .filter(|(&lag, v)| lag > 0 && v.abs() > band)
        .map(|(&lag, _)| lag)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn acf_of_alternating_series() {
        let series: Vec<f64> = (0..100).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        let rho = acf(&series, 2);
        assert_relative_eq!(rho[0], 1.0);
        assert_relative_eq!(rho[1], -0.99, epsilon = 1e-12);
        assert_relative_eq!(rho[2], 0.98, epsilon = 1e-12);
        assert_relative_eq!(autocorrelation(&series, 1), rho[1]);
    }

    #[test]
    fn constant_series_has_zero_autocorrelation() {
        let rho = acf(&[3.0; 20], 3);
        assert_eq!(rho, vec![1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn lags_beyond_length_are_nan() {
        let rho = acf(&[1.0, 2.0, 3.0], 4);
        assert!(rho[3].is_nan() && rho[4].is_nan());
    }

    #[test]
    fn pacf_of_ar1_cuts_off() {
        // Theoretical AR(1) autocorrelations: rho_k = phi^k.
        let phi: f64 = 0.6;
        let rho: Vec<f64> = (0..6).map(|k| phi.powi(k)).collect();
        let partial = pacf_from_acf(&rho);

        assert_relative_eq!(partial[1], 0.6, epsilon = 1e-12);
        for p in &partial[2..] {
            assert_relative_eq!(*p, 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn pacf_of_alternating_ar1_and_degenerate_input() {
        let rho: Vec<f64> = (0..5).map(|k| (-0.8_f64).powi(k)).collect();
        let partial = pacf_from_acf(&rho);
        assert_relative_eq!(partial[0], 1.0);
        assert_relative_eq!(partial[1], -0.8, epsilon = 1e-12);
        assert_relative_eq!(partial[4], 0.0, epsilon = 1e-12);

        // A perfectly correlated series leaves no innovation variance.
        let stuck = pacf_from_acf(&[1.0, 1.0, 1.0]);
        assert_relative_eq!(stuck[1], 1.0);
        assert!(stuck[2].is_nan());
        assert!(pacf_from_acf(&[]).is_empty());
    }

    #[test]
    fn pacf_of_ar2_matches_closed_form() {
        // AR(2) with phi1 = 0.5, phi2 = 0.3.
        let (p1, p2) = (0.5, 0.3);
        let r1 = p1 / (1.0 - p2);
        let r2 = p1 * r1 + p2;
        let r3 = p1 * r2 + p2 * r1;
        let partial = pacf_from_acf(&[1.0, r1, r2, r3]);

        assert_relative_eq!(partial[1], r1, epsilon = 1e-12);
        assert_relative_eq!(partial[2], p2, epsilon = 1e-12);
        assert_relative_eq!(partial[3], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn correlogram_band_and_significance() {
        let series: Vec<f64> = (0..400).map(|i| ((i % 24) as f64 * 0.26).sin()).collect();
        let cg = Correlogram::new(&series, 30);

        assert_eq!(cg.lags.len(), 31);
        assert_relative_eq!(cg.band, 1.96 / 20.0);
        assert!(cg.significant_acf_lags().contains(&24));
        assert!(!cg.significant_acf_lags().contains(&0));
    }
}
