//! Anderson-Darling goodness-of-fit test for the Weibull family.

use crate::distribution::weibull::{fit_weibull, WeibullFit, ZeroPolicy};
use crate::error::{Result, WindError};
use rand::seq::index;
use rand::Rng;
use serde::Serialize;
use tracing::debug;

/// Default cap on the number of values entering the test.
pub const DEFAULT_MAX_POINTS: usize = 1000;

/// Upper-tail critical values of `A*²` for the Weibull case with both
/// parameters estimated (Stephens, 1977), as `(significance, value)`.
pub const CRITICAL_VALUES: [(f64, f64); 5] = [
    (0.25, 0.474),
    (0.10, 0.637),
    (0.05, 0.757),
    (0.025, 0.877),
    (0.01, 1.038),
];

/// Result of the Anderson-Darling test.
#[derive(Debug, Clone, Serialize)]
pub struct GoodnessOfFit {
    /// Raw `A²`.
    pub statistic: f64,
    /// Small-sample corrected `A*² = A²(1 + 0.2/√n)`.
    pub adjusted_statistic: f64,
    /// Approximate p-value, interpolated from [`CRITICAL_VALUES`].
    pub p_value: f64,
    /// True when `p_value` is only a bound (beyond the tabulated range).
    pub p_value_is_bound: bool,
    pub sample_size: usize,
    /// Fit to the tested sample.
    pub sample_fit: WeibullFit,
    /// Fit to all data, for reference.
    pub full_fit: WeibullFit,
}

impl GoodnessOfFit {
    /// Critical value at the tabulated significance level, if any.
    pub fn critical_value(&self, significance: f64) -> Option<f64> {
        CRITICAL_VALUES
            .iter()
            .find(|(a, _)| (a - significance).abs() < 1e-12)
            .map(|&(_, c)| c)
    }

    /// Whether the Weibull hypothesis is rejected at `significance`.
    pub fn rejects_at(&self, significance: f64) -> Option<bool> {
        self.critical_value(significance)
            .map(|c| self.adjusted_statistic > c)
    }

    /// The p-value as a display string, e.g. `0.043` or `>0.25`.
    pub fn p_value_label(&self) -> String {
        if !self.p_value_is_bound {
            format!("{:.3}", self.p_value)
        } else if self.p_value >= CRITICAL_VALUES[0].0 {
            format!(">{}", CRITICAL_VALUES[0].0)
        } else {
            format!("<{}", CRITICAL_VALUES[CRITICAL_VALUES.len() - 1].0)
        }
    }
}

/// Raw Anderson-Darling statistic for positive `values` under `fit`.
pub fn anderson_darling(values: &[f64], fit: &WeibullFit) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = sorted.len();
    let nf = n as f64;

    // t = (x/λ)^k; ln F = ln(1 - e^-t), ln(1 - F) = -t.
    let t: Vec<f64> = sorted.iter().map(|x| (x / fit.scale).powf(fit.shape)).collect();
    let sum: f64 = (0..n)
        .map(|i| {
            let ln_f = (-(-t[i]).exp_m1()).max(f64::MIN_POSITIVE).ln();
            let ln_upper = -t[n - 1 - i];
            (2 * i + 1) as f64 * (ln_f + ln_upper)
        })
        .sum();

    -nf - sum / nf
}

/// Approximate p-value for `A*²`, log-linear between table entries.
fn p_value(adjusted: f64) -> (f64, bool) {
    let (first_alpha, first_c) = CRITICAL_VALUES[0];
    let (last_alpha, last_c) = CRITICAL_VALUES[CRITICAL_VALUES.len() - 1];
    if adjusted <= first_c {
        return (first_alpha, true);
    }
    if adjusted >= last_c {
        return (last_alpha, true);
    }

    for pair in CRITICAL_VALUES.windows(2) {
        let (a0, c0) = pair[0];
        let (a1, c1) = pair[1];
        if adjusted <= c1 {
            let w = (adjusted - c0) / (c1 - c0);
            return ((a0.ln() + w * (a1.ln() - a0.ln())).exp(), false);
        }
    }
    (last_alpha, true)
}

/// Test whether `values` are consistent with a Weibull distribution.
///
/// At most `max_points` positive values are drawn without replacement using
/// `rng`; the sample is refitted and tested against its own fit.
pub fn weibull_goodness_of_fit<R: Rng + ?Sized>(
    values: &[f64],
    fit: &WeibullFit,
    max_points: usize,
    rng: &mut R,
) -> Result<GoodnessOfFit> {
    if max_points < 2 {
        return Err(WindError::InvalidParameter(format!(
            "goodness-of-fit sample cap must be at least 2, got {max_points}"
        )));
    }

    let positive: Vec<f64> = values.iter().copied().filter(|v| *v > 0.0 && v.is_finite()).collect();
    let sample: Vec<f64> = if positive.len() > max_points {
        index::sample(rng, positive.len(), max_points)
            .into_iter()
            .map(|i| positive[i])
            .collect()
    } else {
        positive
    };

    let sample_fit = fit_weibull(&sample, ZeroPolicy::Drop, "goodness-of-fit sample")?;
    let n = sample.len();
    let statistic = anderson_darling(&sample, &sample_fit);
    let adjusted_statistic = statistic * (1.0 + 0.2 / (n as f64).sqrt());
    let (p_value, p_value_is_bound) = p_value(adjusted_statistic);

    debug!(n, statistic, adjusted_statistic, p_value, "anderson-darling test");

    Ok(GoodnessOfFit {
        statistic,
        adjusted_statistic,
        p_value,
        p_value_is_bound,
        sample_size: n,
        sample_fit,
        full_fit: *fit,
    })
}
