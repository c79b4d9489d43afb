//! Seasonal ARIMA fitted by conditional sum of squares.
//!
//! SARIMA(p, d, q)(P, D, Q)\[s\] models
//! `φ(B) Φ(B^s) (1 − B)^d (1 − B^s)^D (y_t − μ) = θ(B) Θ(B^s) ε_t`,
//! where μ is only estimated when no differencing is applied.

use crate::core::{Forecast, HourlySeries, PredictionInterval};
use crate::data::Season;
use crate::error::{Result, WindError};
use crate::models::arima::diff::{differencing_loss, full_difference};
use crate::models::arima::polynomial::{
    ar_polynomial, constrained_ar, constrained_ma, differencing_polynomial, ma_polynomial,
    multiply, psi_weights, seasonal_expand, sparse_terms, unconstrained_ar,
};
use crate::models::Forecaster;
use crate::utils::ols::ols_fit;
use crate::utils::optimization::{nelder_mead, NelderMeadConfig};
use crate::utils::stats::{mean, quantile_normal};
use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info};

/// Model order (p, d, q)(P, D, Q)\[s\].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModelOrder {
    /// Non-seasonal AR order.
    pub p: usize,
    /// Non-seasonal differencing order.
    pub d: usize,
    /// Non-seasonal MA order.
    pub q: usize,
    /// Seasonal AR order.
    pub cap_p: usize,
    /// Seasonal differencing order.
    pub cap_d: usize,
    /// Seasonal MA order.
    pub cap_q: usize,
    /// Seasonal period.
    pub s: usize,
}

impl ModelOrder {
    pub fn new(order: (usize, usize, usize), seasonal: (usize, usize, usize), s: usize) -> Self {
        Self {
            p: order.0,
            d: order.1,
            q: order.2,
            cap_p: seasonal.0,
            cap_d: seasonal.1,
            cap_q: seasonal.2,
            s,
        }
    }

    /// Check if this is a seasonal model.
    pub fn is_seasonal(&self) -> bool {
        self.s > 1 && (self.cap_p > 0 || self.cap_d > 0 || self.cap_q > 0)
    }

    /// AR plus MA coefficients, seasonal included.
    pub fn num_coefficients(&self) -> usize {
        self.p + self.q + self.cap_p + self.cap_q
    }

    /// A mean is estimated only for undifferenced models.
    pub fn includes_mean(&self) -> bool {
        self.d == 0 && self.cap_d == 0
    }

    /// Parameters counted by the information criteria: coefficients, mean, σ².
    pub fn num_params(&self) -> usize {
        self.num_coefficients() + usize::from(self.includes_mean()) + 1
    }

    /// Leading differenced values the conditional sum of squares conditions on.
    pub fn conditioning_lags(&self) -> usize {
        self.p + self.cap_p * self.s
    }

    /// Leading values lost to differencing.
    pub fn differencing_loss(&self) -> usize {
        differencing_loss(self.d, self.cap_d, self.s)
    }

    /// Shortest series this order can be fitted to.
    pub fn min_observations(&self) -> usize {
        self.differencing_loss() + self.conditioning_lags() + 2 * self.num_params() + 8
    }

    fn validate(&self) -> Result<()> {
        if (self.cap_p > 0 || self.cap_d > 0 || self.cap_q > 0) && self.s < 2 {
            return Err(WindError::InvalidParameter(format!(
                "{self} has seasonal terms but period {} < 2",
                self.s
            )));
        }
        Ok(())
    }
}

impl fmt::Display for ModelOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.s > 1 {
            write!(
                f,
                "SARIMA({},{},{})({},{},{})[{}]",
                self.p, self.d, self.q, self.cap_p, self.cap_d, self.cap_q, self.s
            )
        } else {
            write!(f, "ARIMA({},{},{})", self.p, self.d, self.q)
        }
    }
}

/// Optimizer settings for one fit.
#[derive(Debug, Clone)]
pub struct FitOptions {
    pub optimizer: NelderMeadConfig,
    /// Treat an optimizer that stops on its iteration limit as a failed fit.
    pub require_convergence: bool,
    /// Starting point in the unconstrained parameterisation.
    pub initial: Option<Vec<f64>>,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            optimizer: NelderMeadConfig {
                max_iter: 20_000,
                tolerance: 1e-9,
                ..NelderMeadConfig::default()
            },
            require_convergence: true,
            initial: None,
        }
    }
}

impl FitOptions {
    /// Loose budget for screening candidates.
    pub fn approximate() -> Self {
        Self {
            optimizer: NelderMeadConfig::coarse(),
            require_convergence: false,
            initial: None,
        }
    }

    /// Full-precision fit started from a previous solution.
    pub fn refine_from(initial: Vec<f64>) -> Self {
        Self {
            initial: Some(initial),
            ..Self::default()
        }
    }
}

/// Estimated SARIMA coefficients.
///
/// AR terms use the `1 − Σ φ_i B^i` convention and MA terms `1 + Σ θ_j B^j`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SarimaCoefficients {
    pub ar: Vec<f64>,
    pub ma: Vec<f64>,
    pub seasonal_ar: Vec<f64>,
    pub seasonal_ma: Vec<f64>,
    /// Zero for differenced models.
    pub mean: f64,
}

impl SarimaCoefficients {
    /// Decode the unconstrained optimizer vector `[ar | ma | sar | sma | mean?]`.
    fn from_raw(order: &ModelOrder, raw: &[f64]) -> Self {
        let (ar, rest) = raw.split_at(order.p);
        let (ma, rest) = rest.split_at(order.q);
        let (sar, rest) = rest.split_at(order.cap_p);
        let (sma, rest) = rest.split_at(order.cap_q);
        Self {
            ar: constrained_ar(ar),
            ma: constrained_ma(ma),
            seasonal_ar: constrained_ar(sar),
            seasonal_ma: constrained_ma(sma),
            mean: if order.includes_mean() {
                rest.first().copied().unwrap_or(0.0)
            } else {
                0.0
            },
        }
    }

    /// Encode back to the optimizer vector; `None` if not stationary/invertible.
    fn to_raw(&self, order: &ModelOrder) -> Option<Vec<f64>> {
        let negate = |v: &[f64]| v.iter().map(|c| -c).collect::<Vec<_>>();
        let mut raw = unconstrained_ar(&self.ar)?;
        raw.extend(unconstrained_ar(&negate(&self.ma))?);
        raw.extend(unconstrained_ar(&self.seasonal_ar)?);
        raw.extend(unconstrained_ar(&negate(&self.seasonal_ma))?);
        if order.includes_mean() {
            raw.push(self.mean);
        }
        Some(raw)
    }

    /// Expanded `φ(B) Φ(B^s)`.
    pub fn ar_polynomial(&self, period: usize) -> Vec<f64> {
        multiply(
            &ar_polynomial(&self.ar),
            &seasonal_expand(&ar_polynomial(&self.seasonal_ar), period),
        )
    }

    /// Expanded `θ(B) Θ(B^s)`.
    pub fn ma_polynomial(&self, period: usize) -> Vec<f64> {
        multiply(
            &ma_polynomial(&self.ma),
            &seasonal_expand(&ma_polynomial(&self.seasonal_ma), period),
        )
    }

    /// One-step errors of the stationary part over `w`, zero for `t < start`.
    fn residuals(&self, w: &[f64], period: usize, start: usize) -> Vec<f64> {
        let ar_terms = sparse_terms(&self.ar_polynomial(period));
        let ma_terms = sparse_terms(&self.ma_polynomial(period));
        let mu = self.mean;
        let mut e = vec![0.0; w.len()];

        for t in start..w.len() {
            let mut value = w[t] - mu;
            for &(i, c) in &ar_terms {
                value += c * (w[t - i] - mu);
            }
            for &(j, m) in &ma_terms {
                if t >= start + j {
                    value -= m * e[t - j];
                }
            }
            e[t] = value;
        }
        e
    }
}

/// Gaussian negative log-likelihood at the concentrated variance `css / n`.
fn negative_log_likelihood(css: f64, n_eff: usize) -> f64 {
    let n = n_eff as f64;
    0.5 * n * ((2.0 * std::f64::consts::PI * css / n).ln() + 1.0)
}

/// A fitted SARIMA model.
#[derive(Debug, Clone)]
pub struct SarimaModel {
    order: ModelOrder,
    coefficients: SarimaCoefficients,
    raw: Vec<f64>,
    series: Vec<f64>,
    /// Residuals after the conditioning period.
    residuals: Vec<f64>,
    sigma2: f64,
    log_likelihood: f64,
    aic: f64,
    bic: f64,
    converged: bool,
    iterations: usize,
}

impl SarimaModel {
    /// Fit with default optimizer settings.
    pub fn fit(series: &[f64], order: ModelOrder) -> Result<Self> {
        Self::fit_with(series, order, &FitOptions::default())
    }

    /// Fit by minimising the conditional sum of squares.
    ///
    /// Errors name the order, e.g. `fit failed for SARIMA(1,0,1)(1,0,1)[24]`.
    pub fn fit_with(series: &[f64], order: ModelOrder, options: &FitOptions) -> Result<Self> {
        order.validate()?;
        check_series(series, &order)?;
        let target = order.to_string();

        let w = full_difference(series, order.d, order.cap_d, order.s);
        let start = order.conditioning_lags();
        let n_eff = w.len() - start;
        let n_raw = order.num_coefficients() + usize::from(order.includes_mean());

        if w.iter().all(|v| (v - w[0]).abs() < 1e-12) {
            return Err(WindError::fit(target, "differenced series is constant"));
        }

        let initial = match &options.initial {
            Some(v) if v.len() == n_raw => v.clone(),
            _ => {
                let mut v = vec![0.0; n_raw];
                if order.includes_mean() {
                    v[n_raw - 1] = mean(&w);
                }
                v
            }
        };

        let result = nelder_mead(
            |raw| {
                let coefficients = SarimaCoefficients::from_raw(&order, raw);
                let e = coefficients.residuals(&w, order.s, start);
                let css: f64 = e[start..].iter().map(|v| v * v).sum();
                negative_log_likelihood(css, n_eff)
            },
            &initial,
            &options.optimizer,
        );

        if !result.optimal_value.is_finite() {
            return Err(WindError::fit(target, "conditional sum of squares is not finite"));
        }
        if options.require_convergence && !result.converged {
            return Err(WindError::fit(
                target,
                format!("optimizer did not converge in {} iterations", result.iterations),
            ));
        }

        let coefficients = SarimaCoefficients::from_raw(&order, &result.optimal_point);
        let mut model = Self::assemble(order, coefficients, series.to_vec())?;
        model.raw = result.optimal_point;
        model.converged = result.converged;
        model.iterations = result.iterations;

        debug!(
            order = %order,
            aic = model.aic,
            sigma2 = model.sigma2,
            iterations = model.iterations,
            "fitted sarima"
        );
        Ok(model)
    }

    /// Build a model from known coefficients without estimation.
    pub fn from_coefficients(
        series: &[f64],
        order: ModelOrder,
        coefficients: SarimaCoefficients,
    ) -> Result<Self> {
        order.validate()?;
        check_series(series, &order)?;
        let lengths = [
            (coefficients.ar.len(), order.p),
            (coefficients.ma.len(), order.q),
            (coefficients.seasonal_ar.len(), order.cap_p),
            (coefficients.seasonal_ma.len(), order.cap_q),
        ];
        if lengths.iter().any(|(got, want)| got != want) {
            return Err(WindError::InvalidParameter(format!(
                "coefficient counts do not match {order}"
            )));
        }
        let raw = coefficients.to_raw(&order).ok_or_else(|| {
            WindError::InvalidParameter(format!(
                "coefficients for {order} are not stationary and invertible"
            ))
        })?;
        let mut model = Self::assemble(order, coefficients, series.to_vec())?;
        model.raw = raw;
        Ok(model)
    }

    fn assemble(order: ModelOrder, coefficients: SarimaCoefficients, series: Vec<f64>) -> Result<Self> {
        let w = full_difference(&series, order.d, order.cap_d, order.s);
        let start = order.conditioning_lags();
        let residuals = coefficients.residuals(&w, order.s, start)[start..].to_vec();
        let n_eff = residuals.len();
        let css: f64 = residuals.iter().map(|e| e * e).sum();
        let sigma2 = css / n_eff as f64;

        if !(sigma2.is_finite() && sigma2 > 0.0) {
            return Err(WindError::fit(
                order.to_string(),
                format!("residual variance {sigma2} is not positive and finite"),
            ));
        }

        let log_likelihood = -negative_log_likelihood(css, n_eff);
        let k = order.num_params() as f64;
        Ok(Self {
            order,
            coefficients,
            raw: Vec::new(),
            series,
            residuals,
            sigma2,
            log_likelihood,
            aic: -2.0 * log_likelihood + 2.0 * k,
            bic: -2.0 * log_likelihood + k * (n_eff as f64).ln(),
            converged: true,
            iterations: 0,
        })
    }

    pub fn order(&self) -> ModelOrder {
        self.order
    }

    pub fn coefficients(&self) -> &SarimaCoefficients {
        &self.coefficients
    }

    /// Parameters in the optimizer's unconstrained space.
    pub fn raw_parameters(&self) -> &[f64] {
        &self.raw
    }

    /// The series the model was fitted to.
    pub fn series(&self) -> &[f64] {
        &self.series
    }

    /// Innovation variance.
    pub fn sigma2(&self) -> f64 {
        self.sigma2
    }

    pub fn log_likelihood(&self) -> f64 {
        self.log_likelihood
    }

    pub fn aic(&self) -> f64 {
        self.aic
    }

    pub fn bic(&self) -> f64 {
        self.bic
    }

    /// Residuals after the conditioning period.
    pub fn residuals(&self) -> &[f64] {
        &self.residuals
    }

    pub fn converged(&self) -> bool {
        self.converged
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Residuals aligned with the input series, NaN where undefined.
    pub fn aligned_residuals(&self) -> Vec<f64> {
        let lead = self.series.len() - self.residuals.len();
        std::iter::repeat(f64::NAN)
            .take(lead)
            .chain(self.residuals.iter().copied())
            .collect()
    }

    /// One-step-ahead fitted values on the original scale, NaN where undefined.
    pub fn fitted_values(&self) -> Vec<f64> {
        self.series
            .iter()
            .zip(self.aligned_residuals())
            .map(|(y, e)| y - e)
            .collect()
    }

    /// Coefficients of the integrated AR polynomial `φ(B)Φ(B^s)(1−B)^d(1−B^s)^D`.
    fn integrated_ar(&self) -> Vec<f64> {
        let o = &self.order;
        multiply(
            &self.coefficients.ar_polynomial(o.s),
            &differencing_polynomial(o.d, o.cap_d, o.s),
        )
    }

    /// Forecast from the end of the fitted series.
    pub fn forecast(&self, horizon: usize, levels: &[f64]) -> Result<Forecast> {
        self.forecast_from(&self.series, horizon, levels)
    }

    /// Forecast from the end of `history` with the model's coefficients.
    ///
    /// Residuals are re-derived by filtering `history`; nothing is re-estimated.
    pub fn forecast_from(&self, history: &[f64], horizon: usize, levels: &[f64]) -> Result<Forecast> {
        check_levels(levels)?;
        let o = &self.order;
        let lead = o.differencing_loss() + o.conditioning_lags();
        if history.len() <= lead {
            return Err(WindError::InsufficientData {
                needed: lead + 1,
                got: history.len(),
            });
        }
        if history.iter().any(|v| !v.is_finite()) {
            return Err(WindError::InvalidParameter(
                "forecast history must not contain missing values".into(),
            ));
        }
        if horizon == 0 {
            return Ok(Forecast::new());
        }

        let n = history.len();
        let w = full_difference(history, o.d, o.cap_d, o.s);
        let e_w = self.coefficients.residuals(&w, o.s, o.conditioning_lags());
        let mut e = vec![0.0; o.differencing_loss()];
        e.extend(e_w);
        e.resize(n + horizon, 0.0);

        let ar_full = self.integrated_ar();
        let ma_full = self.coefficients.ma_polynomial(o.s);
        let ar_terms = sparse_terms(&ar_full);
        let ma_terms = sparse_terms(&ma_full);
        let mu = self.coefficients.mean;

        let mut x: Vec<f64> = history.iter().map(|v| v - mu).collect();
        for t in n..n + horizon {
            let mut value = 0.0;
            for &(i, c) in &ar_terms {
                value -= c * x[t - i];
            }
            for &(j, m) in &ma_terms {
                value += m * e[t - j];
            }
            x.push(value);
        }
        let point: Vec<f64> = x[n..].iter().map(|v| v + mu).collect();

        let psi = psi_weights(&ar_full, &ma_full, horizon);
        let mut cumulative = 0.0;
        let std_errors: Vec<f64> = psi
            .iter()
            .map(|p| {
                cumulative += p * p;
                (self.sigma2 * cumulative).sqrt()
            })
            .collect();

        let mut forecast = Forecast::from_values(point.clone());
        for &level in levels {
            let z = quantile_normal((1.0 + level) / 2.0);
            forecast = forecast.with_interval(PredictionInterval {
                level,
                lower: point.iter().zip(&std_errors).map(|(p, s)| p - z * s).collect(),
                upper: point.iter().zip(&std_errors).map(|(p, s)| p + z * s).collect(),
            });
        }
        Ok(forecast)
    }
}

impl Forecaster for SarimaModel {
    fn name(&self) -> String {
        self.order.to_string()
    }

    fn predict_with_intervals(&self, horizon: usize, levels: &[f64]) -> Result<Forecast> {
        self.forecast(horizon, levels)
    }

    fn residuals(&self) -> &[f64] {
        &self.residuals
    }
}

fn check_series(series: &[f64], order: &ModelOrder) -> Result<()> {
    if series.iter().any(|v| !v.is_finite()) {
        return Err(WindError::InvalidParameter(
            "SARIMA input must not contain missing values".into(),
        ));
    }
    let needed = order.min_observations();
    if series.len() < needed {
        return Err(WindError::InsufficientData {
            needed,
            got: series.len(),
        });
    }
    Ok(())
}

fn check_levels(levels: &[f64]) -> Result<()> {
    match levels.iter().find(|l| !(**l > 0.0 && **l < 1.0)) {
        Some(level) => Err(WindError::InvalidParameter(format!(
            "interval level {level} must lie strictly between 0 and 1"
        ))),
        None => Ok(()),
    }
}

/// Season-indicator regression removed before the SARIMA fit.
///
/// `y_t = β_0 + Σ_s β_s 1[season_t = s] + u_t` with one dummy per season other
/// than the reference (the first season present).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonRegression {
    pub intercept: f64,
    pub reference: Season,
    /// Offset of each non-reference season from the reference.
    pub effects: BTreeMap<Season, f64>,
}

impl SeasonRegression {
    pub fn fit(values: &[f64], seasons: &[Season]) -> Result<Self> {
        if values.len() != seasons.len() {
            return Err(WindError::InvalidParameter(format!(
                "{} values but {} season labels",
                values.len(),
                seasons.len()
            )));
        }
        let mut present: Vec<Season> = seasons.to_vec();
        present.sort();
        present.dedup();
        let reference = *present.first().ok_or(WindError::InsufficientData { needed: 1, got: 0 })?;
        let others = &present[1..];

        let mut columns = vec![vec![1.0; values.len()]];
        for season in others {
            columns.push(seasons.iter().map(|s| f64::from(u8::from(s == season))).collect());
        }
        let fit = ols_fit(values, &columns)?;

        Ok(Self {
            intercept: fit.coefficients[0],
            reference,
            effects: others
                .iter()
                .zip(&fit.coefficients[1..])
                .map(|(s, b)| (*s, *b))
                .collect(),
        })
    }

    /// Regression mean for an hour in `season`.
    pub fn effect(&self, season: Season) -> f64 {
        self.intercept + self.effects.get(&season).copied().unwrap_or(0.0)
    }

    /// `values` minus the regression mean of each hour.
    pub fn remove(&self, values: &[f64], seasons: &[Season]) -> Vec<f64> {
        values
            .iter()
            .zip(seasons)
            .map(|(v, s)| v - self.effect(*s))
            .collect()
    }
}

/// The model selected for forecasting, fitted once on the full series.
#[derive(Debug, Clone)]
pub struct FrozenModel {
    model: SarimaModel,
    regression: Option<SeasonRegression>,
    last_timestamp: NaiveDateTime,
}

impl FrozenModel {
    /// Fit `order` to the gap-interpolated `series` and freeze it.
    pub fn freeze(series: &HourlySeries, order: ModelOrder, season_regressors: bool) -> Result<Self> {
        let filled = series.interpolated();
        let last_timestamp = filled
            .last_timestamp()
            .ok_or(WindError::InsufficientData { needed: 1, got: 0 })?;

        let regression = if season_regressors {
            Some(SeasonRegression::fit(filled.values(), filled.seasons())?)
        } else {
            None
        };
        let target = match &regression {
            Some(r) => r.remove(filled.values(), filled.seasons()),
            None => filled.values().to_vec(),
        };

        let model = SarimaModel::fit(&target, order)?;
        info!(
            order = %order,
            aic = model.aic(),
            sigma2 = model.sigma2(),
            season_regressors,
            "froze forecasting model"
        );

        Ok(Self {
            model,
            regression,
            last_timestamp,
        })
    }

    pub fn model(&self) -> &SarimaModel {
        &self.model
    }

    pub fn order(&self) -> ModelOrder {
        self.model.order()
    }

    pub fn regression(&self) -> Option<&SeasonRegression> {
        self.regression.as_ref()
    }

    /// Last hour of the series the model was fitted to.
    pub fn last_timestamp(&self) -> NaiveDateTime {
        self.last_timestamp
    }

    /// Regression means in the original units, aligned with the fitted series.
    pub fn regression_means(&self, seasons: &[Season]) -> Vec<f64> {
        match &self.regression {
            Some(r) => seasons.iter().map(|s| r.effect(*s)).collect(),
            None => vec![0.0; seasons.len()],
        }
    }

    /// Forecast the `horizon` hours after the fitted series.
    pub fn forecast(&self, horizon: usize, levels: &[f64]) -> Result<Forecast> {
        let future = hours_after(self.last_timestamp, horizon);
        let base = self.model.forecast(horizon, levels)?;
        Ok(self.restore(base, future))
    }

    /// Forecast after `history` using the frozen coefficients.
    ///
    /// `history` is gap-interpolated and filtered to re-derive residuals; the
    /// coefficients are not re-estimated.
    pub fn forecast_from_history(
        &self,
        history: &HourlySeries,
        horizon: usize,
        levels: &[f64],
    ) -> Result<Forecast> {
        let filled = history.interpolated();
        let last = filled
            .last_timestamp()
            .ok_or(WindError::InsufficientData { needed: 1, got: 0 })?;
        let values = match &self.regression {
            Some(r) => r.remove(filled.values(), filled.seasons()),
            None => filled.values().to_vec(),
        };
        let base = self.model.forecast_from(&values, horizon, levels)?;
        Ok(self.restore(base, hours_after(last, horizon)))
    }

    fn restore(&self, base: Forecast, future: Vec<NaiveDateTime>) -> Forecast {
        let seasons: Vec<Season> = future.iter().map(Season::of).collect();
        let forecast = match &self.regression {
            Some(_) => base.shifted(&self.regression_means(&seasons)),
            None => base,
        };
        forecast.with_timestamps(future)
    }
}

impl Forecaster for FrozenModel {
    fn name(&self) -> String {
        match self.regression {
            Some(_) => format!("{} + season regressors", self.model.order()),
            None => self.model.order().to_string(),
        }
    }

    fn predict_with_intervals(&self, horizon: usize, levels: &[f64]) -> Result<Forecast> {
        self.forecast(horizon, levels)
    }

    fn residuals(&self) -> &[f64] {
        self.model.residuals()
    }
}

fn hours_after(last: NaiveDateTime, horizon: usize) -> Vec<NaiveDateTime> {
    (1..=horizon)
        .map(|h| last + Duration::hours(h as i64))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rand_distr::{Distribution, Normal};

    fn shocks(n: usize, seed: u64) -> Vec<f64> {
        let normal = Normal::new(0.0, 1.0).unwrap();
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n).map(|_| normal.sample(&mut rng)).collect()
    }

    /// y_t = mean + x_t with (1 - phi B)(1 - sphi B^s) x_t = (1 + theta B) e_t.
    fn simulate(phi: f64, sphi: f64, theta: f64, s: usize, mean: f64, n: usize, seed: u64) -> Vec<f64> {
        let burn = 500;
        let e = shocks(n + burn, seed);
        let mut x = vec![0.0; n + burn];
        for t in 0..n + burn {
            let mut v = e[t];
            if t >= 1 {
                v += phi * x[t - 1] + theta * e[t - 1];
            }
            if t >= s {
                v += sphi * x[t - s];
            }
            if t > s {
                v -= phi * sphi * x[t - s - 1];
            }
            x[t] = v;
        }
        x[burn..].iter().map(|v| v + mean).collect()
    }

    #[test]
    fn order_display_and_counts() {
        let order = ModelOrder::new((2, 0, 1), (1, 0, 1), 24);
        assert_eq!(order.to_string(), "SARIMA(2,0,1)(1,0,1)[24]");
        assert_eq!(order.num_coefficients(), 5);
        assert!(order.includes_mean());
        assert_eq!(order.num_params(), 7);
        assert_eq!(order.conditioning_lags(), 26);
        assert_eq!(ModelOrder::new((1, 1, 0), (0, 0, 0), 0).to_string(), "ARIMA(1,1,0)");
    }

    #[test]
    fn recovers_ar1_with_mean() {
        let y = simulate(0.6, 0.0, 0.0, 1, 10.0, 2000, 1);
        let model = SarimaModel::fit(&y, ModelOrder::new((1, 0, 0), (0, 0, 0), 0)).unwrap();

        assert_relative_eq!(model.coefficients().ar[0], 0.6, epsilon = 0.05);
        assert_relative_eq!(model.coefficients().mean, 10.0, epsilon = 0.3);
        assert_relative_eq!(model.sigma2(), 1.0, epsilon = 0.1);
        assert!(model.converged());
    }

    #[test]
    fn recovers_seasonal_ar() {
        let y = simulate(0.5, 0.4, 0.0, 24, 0.0, 3000, 2);
        let model = SarimaModel::fit(&y, ModelOrder::new((1, 0, 0), (1, 0, 0), 24)).unwrap();

        assert_relative_eq!(model.coefficients().ar[0], 0.5, epsilon = 0.07);
        assert_relative_eq!(model.coefficients().seasonal_ar[0], 0.4, epsilon = 0.07);
    }

    #[test]
    fn recovers_ma1() {
        let y = simulate(0.0, 0.0, 0.5, 1, 3.0, 2000, 3);
        let model = SarimaModel::fit(&y, ModelOrder::new((0, 0, 1), (0, 0, 0), 0)).unwrap();
        assert_relative_eq!(model.coefficients().ma[0], 0.5, epsilon = 0.06);
    }

    #[test]
    fn information_criteria_are_consistent() {
        let y = simulate(0.6, 0.0, 0.0, 1, 5.0, 500, 4);
        let order = ModelOrder::new((1, 0, 0), (0, 0, 0), 0);
        let model = SarimaModel::fit(&y, order).unwrap();
        let n_eff = model.residuals().len() as f64;

        assert_eq!(model.residuals().len(), 499);
        assert_relative_eq!(model.aic(), -2.0 * model.log_likelihood() + 6.0, epsilon = 1e-9);
        assert_relative_eq!(
            model.bic(),
            -2.0 * model.log_likelihood() + 3.0 * n_eff.ln(),
            epsilon = 1e-9
        );
    }

    #[test]
    fn constant_series_fails_naming_the_order() {
        let err = SarimaModel::fit(&[4.0; 200], ModelOrder::new((1, 0, 0), (0, 0, 0), 0)).unwrap_err();
        match err {
            WindError::Fit { target, .. } => assert_eq!(target, "ARIMA(1,0,0)"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn short_or_gappy_series_are_rejected() {
        let order = ModelOrder::new((2, 0, 1), (1, 0, 1), 24);
        assert!(matches!(
            SarimaModel::fit(&[1.0; 30], order),
            Err(WindError::InsufficientData { .. })
        ));
        let mut y = simulate(0.5, 0.0, 0.0, 1, 0.0, 100, 5);
        y[3] = f64::NAN;
        assert!(SarimaModel::fit(&y, ModelOrder::new((1, 0, 0), (0, 0, 0), 0)).is_err());
    }

    #[test]
    fn seasonal_terms_need_a_period() {
        let y = simulate(0.5, 0.0, 0.0, 1, 0.0, 300, 6);
        let err = SarimaModel::fit(&y, ModelOrder::new((1, 0, 0), (1, 0, 0), 0)).unwrap_err();
        assert!(matches!(err, WindError::InvalidParameter(_)));
    }

    fn known_ar1(series: &[f64]) -> SarimaModel {
        SarimaModel::from_coefficients(
            series,
            ModelOrder::new((1, 0, 0), (0, 0, 0), 0),
            SarimaCoefficients {
                ar: vec![0.5],
                ma: vec![],
                seasonal_ar: vec![],
                seasonal_ma: vec![],
                mean: 2.0,
            },
        )
        .unwrap()
    }

    #[test]
    fn ar1_forecast_decays_to_the_mean() {
        let mut y = simulate(0.5, 0.0, 0.0, 1, 2.0, 200, 7);
        *y.last_mut().unwrap() = 6.0;
        let model = known_ar1(&y);
        let forecast = model.forecast(30, &[0.8, 0.95]).unwrap();

        assert_relative_eq!(forecast.point()[0], 2.0 + 0.5 * 4.0, epsilon = 1e-12);
        assert_relative_eq!(forecast.point()[1], 2.0 + 0.25 * 4.0, epsilon = 1e-12);
        assert_relative_eq!(forecast.point()[29], 2.0, epsilon = 1e-6);

        // one-step standard error is sigma, long-run it is sigma / sqrt(1 - phi^2)
        let sigma = model.sigma2().sqrt();
        let z95 = quantile_normal(0.975);
        let i95 = forecast.interval(0.95).unwrap();
        assert_relative_eq!(i95.upper[0] - forecast.point()[0], z95 * sigma, epsilon = 1e-9);
        assert_relative_eq!(
            i95.upper[29] - forecast.point()[29],
            z95 * sigma / (0.75_f64).sqrt(),
            epsilon = 1e-6
        );
    }

    #[test]
    fn intervals_nest_and_widen() {
        let y = simulate(0.5, 0.3, 0.2, 24, 7.0, 1500, 8);
        let model = SarimaModel::fit(&y, ModelOrder::new((1, 0, 1), (1, 0, 0), 24)).unwrap();
        let forecast = model.forecast(48, &[0.8, 0.95]).unwrap();
        let i80 = forecast.interval(0.8).unwrap();
        let i95 = forecast.interval(0.95).unwrap();

        assert_eq!(forecast.horizon(), 48);
        for h in 0..48 {
            let p = forecast.point()[h];
            assert!(i95.lower[h] <= i80.lower[h] && i80.lower[h] <= p);
            assert!(p <= i80.upper[h] && i80.upper[h] <= i95.upper[h]);
        }
        for h in 1..48 {
            assert!(i95.upper[h] - i95.lower[h] >= i95.upper[h - 1] - i95.lower[h - 1] - 1e-12);
        }
    }

    #[test]
    fn random_walk_forecast_is_flat_with_sqrt_h_bands() {
        let mut level = 0.0;
        let y: Vec<f64> = shocks(400, 9)
            .into_iter()
            .map(|e| {
                level += e;
                level
            })
            .collect();
        let model = SarimaModel::fit(&y, ModelOrder::new((0, 1, 0), (0, 0, 0), 0)).unwrap();
        let forecast = model.forecast(9, &[0.95]).unwrap();
        let last = *y.last().unwrap();
        let i95 = forecast.interval(0.95).unwrap();

        assert!(forecast.point().iter().all(|p| (p - last).abs() < 1e-12));
        let w1 = i95.upper[0] - forecast.point()[0];
        let w9 = i95.upper[8] - forecast.point()[8];
        assert_relative_eq!(w9 / w1, 3.0, epsilon = 1e-9);
    }

    #[test]
    fn seasonal_difference_forecast_repeats_last_season() {
        // A pure seasonal pattern is reproduced by (0,0,0)(0,1,0)[4].
        let pattern = [1.0, 3.0, 2.0, 5.0];
        let noise = shocks(80, 10);
        let y: Vec<f64> = (0..80).map(|i| pattern[i % 4] + 0.01 * noise[i]).collect();
        let model = SarimaModel::fit(&y, ModelOrder::new((0, 0, 0), (0, 1, 0), 4)).unwrap();
        let forecast = model.forecast(4, &[]).unwrap();

        for h in 0..4 {
            assert_relative_eq!(forecast.point()[h], y[76 + h], epsilon = 1e-12);
        }
    }

    #[test]
    fn forecast_from_own_series_matches_forecast() {
        let y = simulate(0.6, 0.0, 0.3, 1, 4.0, 300, 11);
        let model = SarimaModel::fit(&y, ModelOrder::new((1, 0, 1), (0, 0, 0), 0)).unwrap();
        let a = model.forecast(12, &[0.95]).unwrap();
        let b = model.forecast_from(&y, 12, &[0.95]).unwrap();
        assert_eq!(a.point(), b.point());
    }

    #[test]
    fn invalid_levels_are_rejected() {
        let y = simulate(0.5, 0.0, 0.0, 1, 2.0, 200, 12);
        let model = known_ar1(&y);
        assert!(model.forecast(5, &[1.0]).is_err());
        assert!(model.forecast(5, &[0.0]).is_err());
        assert!(model.forecast(0, &[0.9]).unwrap().is_empty());
    }

    #[test]
    fn fitted_values_plus_residuals_reproduce_series() {
        let y = simulate(0.5, 0.0, 0.0, 1, 2.0, 200, 13);
        let model = known_ar1(&y);
        let fitted = model.fitted_values();
        let residuals = model.aligned_residuals();

        assert!(fitted[0].is_nan());
        for t in 1..y.len() {
            assert_relative_eq!(fitted[t] + residuals[t], y[t], epsilon = 1e-12);
        }
        assert_relative_eq!(fitted[1], 2.0 + 0.5 * (y[0] - 2.0), epsilon = 1e-12);
    }

    #[test]
    fn non_stationary_coefficients_are_rejected() {
        let y = simulate(0.5, 0.0, 0.0, 1, 2.0, 200, 14);
        let result = SarimaModel::from_coefficients(
            &y,
            ModelOrder::new((1, 0, 0), (0, 0, 0), 0),
            SarimaCoefficients {
                ar: vec![1.1],
                ma: vec![],
                seasonal_ar: vec![],
                seasonal_ma: vec![],
                mean: 0.0,
            },
        );
        assert!(result.is_err());
    }

    fn hourly(values: Vec<f64>) -> HourlySeries {
        let start = NaiveDate::from_ymd_opt(2024, 2, 20)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        HourlySeries::from_values(start, values)
    }

    #[test]
    fn frozen_model_forecasts_after_the_series() {
        let mut values = simulate(0.7, 0.3, 0.0, 24, 8.0, 24 * 30, 15);
        values[100] = f64::NAN;
        values[101] = f64::NAN;
        let series = hourly(values);
        let order = ModelOrder::new((1, 0, 0), (1, 0, 0), 24);
        let frozen = FrozenModel::freeze(&series, order, false).unwrap();
        let forecast = frozen.forecast(48, &[0.8, 0.95]).unwrap();

        assert_eq!(forecast.horizon(), 48);
        assert_eq!(forecast.timestamps().len(), 48);
        assert_eq!(
            forecast.timestamps()[0],
            series.last_timestamp().unwrap() + Duration::hours(1)
        );
        assert_eq!(frozen.name(), "SARIMA(1,0,0)(1,0,0)[24]");
    }

    #[test]
    fn recent_window_forecast_reuses_coefficients() {
        let series = hourly(simulate(0.7, 0.3, 0.0, 24, 8.0, 24 * 30, 16));
        let order = ModelOrder::new((1, 0, 0), (1, 0, 0), 24);
        let frozen = FrozenModel::freeze(&series, order, false).unwrap();
        let before = frozen.model().coefficients().clone();

        let recent = series.tail(240).unwrap();
        let from_recent = frozen.forecast_from_history(&recent, 48, &[0.95]).unwrap();
        let full = frozen.forecast(48, &[0.95]).unwrap();

        assert_eq!(frozen.model().coefficients(), &before);
        assert_eq!(from_recent.horizon(), 48);
        assert_eq!(from_recent.timestamps(), full.timestamps());
        // Both runs end at the same hour; only start-up residuals differ.
        assert_relative_eq!(from_recent.point()[0], full.point()[0], epsilon = 1e-6);
    }

    #[test]
    fn season_regression_recovers_offsets() {
        let seasons: Vec<Season> = (0..400)
            .map(|i| if i < 200 { Season::Summer } else { Season::Autumn })
            .collect();
        let noise = shocks(400, 17);
        let values: Vec<f64> = seasons
            .iter()
            .zip(&noise)
            .map(|(s, e)| {
                let level = if *s == Season::Summer { 5.0 } else { 8.0 };
                level + 0.1 * e
            })
            .collect();
        let regression = SeasonRegression::fit(&values, &seasons).unwrap();

        assert_eq!(regression.reference, Season::Summer);
        assert_relative_eq!(regression.intercept, 5.0, epsilon = 0.05);
        assert_relative_eq!(regression.effect(Season::Autumn), 8.0, epsilon = 0.05);
        // unseen seasons fall back to the reference level
        assert_relative_eq!(regression.effect(Season::Winter), regression.intercept);
        let residual = regression.remove(&values, &seasons);
        assert!(residual.iter().all(|r| r.abs() < 1.0));
    }

    #[test]
    fn frozen_model_with_season_regressors() {
        // 2024-02-20 + 30 days crosses from Summer into Autumn.
        let base = simulate(0.6, 0.0, 0.0, 1, 0.0, 24 * 30, 18);
        let series = hourly(base);
        let shifted: Vec<f64> = series
            .values()
            .iter()
            .zip(series.seasons())
            .map(|(v, s)| v + if *s == Season::Summer { 6.0 } else { 9.0 })
            .collect();
        let series = hourly(shifted);

        let order = ModelOrder::new((1, 0, 0), (0, 0, 0), 24);
        let frozen = FrozenModel::freeze(&series, order, true).unwrap();
        let forecast = frozen.forecast(48, &[0.95]).unwrap();

        assert!(frozen.regression().is_some());
        assert!(frozen.name().ends_with("season regressors"));
        // March forecasts revert to the Autumn level.
        assert_relative_eq!(forecast.point()[47], 9.0, epsilon = 0.5);
    }
}
