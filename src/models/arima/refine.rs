//! Manual order refinement: fit one order pair and inspect its residuals.

use crate::error::Result;
use crate::features::Correlogram;
use crate::models::arima::model::{ModelOrder, SarimaModel};
use crate::utils::stats::{mean, variance};
use crate::validation::{ljung_box, LjungBoxResult};
use serde::Serialize;
use tracing::info;

/// Ljung-Box lags reported for hourly data: one and two days.
pub const LJUNG_BOX_LAGS: [usize; 2] = [24, 48];

/// Residual checks for a fitted model.
#[derive(Debug, Clone, Serialize)]
pub struct ResidualDiagnostics {
    /// One test per lag in [`LJUNG_BOX_LAGS`] that the residuals can support.
    pub ljung_box: Vec<LjungBoxResult>,
    pub correlogram: Correlogram,
    pub aic: f64,
    pub bic: f64,
    pub log_likelihood: f64,
    pub residual_mean: f64,
    pub residual_variance: f64,
    /// Residuals the diagnostics are computed on.
    pub n: usize,
}

impl ResidualDiagnostics {
    /// Whether every Ljung-Box test accepts white noise at `alpha`.
    pub fn residuals_look_white(&self, alpha: f64) -> bool {
        self.ljung_box.iter().all(|lb| lb.is_white_noise(alpha))
    }
}

/// A fitted candidate and its diagnostics.
#[derive(Debug, Clone)]
pub struct Refinement {
    pub model: SarimaModel,
    pub diagnostics: ResidualDiagnostics,
}

/// Compute residual diagnostics up to `max_lag`.
pub fn diagnose(model: &SarimaModel, max_lag: usize) -> ResidualDiagnostics {
    let residuals = model.residuals();
    let n = residuals.len();
    let fitted_params = model.order().num_coefficients();
    let ljung_box = LJUNG_BOX_LAGS
        .iter()
        .filter(|&&lag| lag > fitted_params && lag < n)
        .map(|&lag| ljung_box(residuals, Some(lag), fitted_params))
        .collect();

    ResidualDiagnostics {
        ljung_box,
        correlogram: Correlogram::new(residuals, max_lag.min(n.saturating_sub(1))),
        aic: model.aic(),
        bic: model.bic(),
        log_likelihood: model.log_likelihood(),
        residual_mean: mean(residuals),
        residual_variance: variance(residuals),
        n,
    }
}

/// Fit SARIMA(`order`)(`seasonal_order`)\[`period`\] and diagnose it, with
/// residual ACF/PACF up to `max_lag`.
///
/// Fit failures are returned to the caller; nothing is retried.
pub fn refine(
    series: &[f64],
    order: (usize, usize, usize),
    seasonal_order: (usize, usize, usize),
    period: usize,
    max_lag: usize,
) -> Result<Refinement> {
    let order = ModelOrder::new(order, seasonal_order, period);
    let model = SarimaModel::fit(series, order)?;
    let diagnostics = diagnose(&model, max_lag);
    info!(
        order = %order,
        aic = diagnostics.aic,
        bic = diagnostics.bic,
        white = diagnostics.residuals_look_white(0.05),
        "refinement candidate"
    );
    Ok(Refinement { model, diagnostics })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rand_distr::{Distribution, Normal};

    fn ar1(phi: f64, n: usize, seed: u64) -> Vec<f64> {
        let normal = Normal::new(0.0, 1.0).unwrap();
        let mut rng = StdRng::seed_from_u64(seed);
        let mut x = 0.0;
        (0..n + 100)
            .map(|_| {
                x = phi * x + normal.sample(&mut rng);
                x
            })
            .skip(100)
            .collect()
    }

    #[test]
    fn refinement_reports_model_statistics() {
        let series = ar1(0.8, 800, 1);
        let refinement = refine(&series, (1, 0, 0), (0, 0, 0), 24, 48).unwrap();
        let d = &refinement.diagnostics;

        assert_eq!(d.n, 799);
        assert_relative_eq!(d.aic, refinement.model.aic());
        assert_eq!(d.ljung_box.len(), 2);
        assert_eq!(d.ljung_box[0].lags, 24);
        assert_eq!(d.correlogram.lags.len(), 49);
        assert!(d.residual_mean.abs() < 0.2);
    }

    #[test]
    fn underfitted_model_leaves_correlated_residuals() {
        let series = ar1(0.8, 800, 2);
        let good = refine(&series, (1, 0, 0), (0, 0, 0), 24, 48).unwrap();
        let bad = refine(&series, (0, 0, 0), (0, 0, 0), 24, 48).unwrap();

        assert!(!bad.diagnostics.residuals_look_white(0.05));
        assert!(bad.diagnostics.correlogram.acf[1] > 0.5);
        assert!(good.diagnostics.aic < bad.diagnostics.aic);
    }

    #[test]
    fn correlogram_depth_follows_max_lag() {
        let series = ar1(0.5, 400, 3);
        let short = refine(&series, (1, 0, 0), (0, 0, 0), 24, 12).unwrap();
        let long = refine(&series, (1, 0, 0), (0, 0, 0), 24, 72).unwrap();

        assert_eq!(short.diagnostics.correlogram.lags.len(), 13);
        assert_eq!(long.diagnostics.correlogram.lags.len(), 73);
        assert_relative_eq!(short.diagnostics.aic, long.diagnostics.aic);
    }

    #[test]
    fn fit_failure_is_returned() {
        assert!(refine(&[1.0; 20], (2, 0, 2), (1, 0, 1), 24, 48).is_err());
    }
}
