//! Automatic SARIMA order selection by AIC.
//!
//! Two strategies are offered. Stepwise search follows Hyndman and Khandakar:
//! four starting models, then ±1 moves around the current best until no
//! neighbour improves. Exhaustive search fits every order up to the maxima.
//! The differencing orders are fixed before either search begins, since AIC
//! values are not comparable across different `d` or `D`.

use crate::error::{Result, WindError};
use crate::models::arima::diff::{difference, seasonal_difference};
use crate::models::arima::model::{FitOptions, ModelOrder, SarimaModel};
use crate::utils::stats::variance;
use crate::validation::kpss_test;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// How the forecasting order is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    /// Use the configured order as is.
    #[default]
    None,
    Stepwise,
    Exhaustive,
}

/// Configuration for the order search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub mode: SearchMode,
    /// Maximum non-seasonal AR order to consider.
    pub max_p: usize,
    /// Maximum non-seasonal MA order to consider.
    pub max_q: usize,
    /// Maximum seasonal AR order.
    pub max_cap_p: usize,
    /// Maximum seasonal MA order.
    pub max_cap_q: usize,
    /// Maximum non-seasonal differencing order.
    pub max_d: usize,
    /// Maximum seasonal differencing order.
    pub max_cap_d: usize,
    /// Seasonal period (0 or 1 for non-seasonal).
    ///
    /// The analysis pipeline replaces this with `[sarima] period`.
    pub period: usize,
    /// Upper bound on candidate fits in stepwise mode.
    pub max_models: usize,
    /// Screen candidates with a coarse optimizer and refit the winner.
    pub approximation: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            mode: SearchMode::None,
            max_p: 3,
            max_q: 3,
            max_cap_p: 1,
            max_cap_q: 1,
            max_d: 1,
            max_cap_d: 1,
            period: 24,
            max_models: 30,
            approximation: true,
        }
    }
}

impl SearchConfig {
    fn is_seasonal(&self) -> bool {
        self.period >= 2
    }

    fn within_bounds(&self, p: usize, q: usize, cap_p: usize, cap_q: usize) -> bool {
        p <= self.max_p && q <= self.max_q && cap_p <= self.max_cap_p && cap_q <= self.max_cap_q
    }

    fn order(&self, (p, q, cap_p, cap_q): (usize, usize, usize, usize), d: usize, cap_d: usize) -> ModelOrder {
        if self.is_seasonal() {
            ModelOrder::new((p, d, q), (cap_p, cap_d, cap_q), self.period)
        } else {
            ModelOrder::new((p, d, q), (0, 0, 0), 0)
        }
    }
}

/// Result of fitting one candidate order.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateOutcome {
    pub order: ModelOrder,
    pub aic: Option<f64>,
    /// Why the fit failed, if it did.
    pub error: Option<String>,
}

/// Best model plus the record of every candidate tried.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub best: SarimaModel,
    /// Candidates in the order they were fitted.
    pub candidates: Vec<CandidateOutcome>,
    /// Chosen non-seasonal differencing order.
    pub d: usize,
    /// Chosen seasonal differencing order.
    pub cap_d: usize,
}

impl SearchResult {
    /// Successful candidates, lowest AIC first.
    pub fn ranked(&self) -> Vec<&CandidateOutcome> {
        let mut fitted: Vec<_> = self.candidates.iter().filter(|c| c.aic.is_some()).collect();
        fitted.sort_by(|a, b| {
            a.aic
                .partial_cmp(&b.aic)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        fitted
    }

    /// Number of candidates whose fit failed.
    pub fn failures(&self) -> usize {
        self.candidates.iter().filter(|c| c.error.is_some()).count()
    }
}

/// Number of first differences needed for KPSS level stationarity.
pub fn ndiffs(series: &[f64], max_d: usize) -> usize {
    let mut current = series.to_vec();
    for d in 0..max_d {
        match kpss_test(&current, None) {
            Ok(result) if result.is_stationary => return d,
            Ok(_) => current = difference(&current, 1),
            Err(_) => return d,
        }
    }
    max_d
}

/// Variance ratio below which a seasonal difference is taken.
///
/// A seasonal difference that removes at least 30% of the variance signals a
/// seasonal component strong enough to difference away; weaker cycles are left
/// to the seasonal AR/MA terms.
pub const SEASONAL_VARIANCE_RATIO: f64 = 0.7;

/// Seasonal differences suggested by how much they reduce the variance.
///
/// Each round takes one more seasonal difference while it brings the variance
/// below [`SEASONAL_VARIANCE_RATIO`] of the current series.
pub fn nsdiffs(series: &[f64], period: usize, max_cap_d: usize) -> usize {
    let mut current = series.to_vec();
    for cap_d in 0..max_cap_d {
        if period < 2 || current.len() < 2 * period {
            return cap_d;
        }
        let differenced = seasonal_difference(&current, 1, period);
        if variance(&differenced) < SEASONAL_VARIANCE_RATIO * variance(&current) {
            current = differenced;
        } else {
            return cap_d;
        }
    }
    max_cap_d
}

struct Search<'a> {
    series: &'a [f64],
    config: &'a SearchConfig,
    options: FitOptions,
    visited: HashSet<ModelOrder>,
    candidates: Vec<CandidateOutcome>,
    best: Option<SarimaModel>,
}

impl<'a> Search<'a> {
    fn new(series: &'a [f64], config: &'a SearchConfig) -> Self {
        let options = if config.approximation {
            FitOptions::approximate()
        } else {
            FitOptions::default()
        };
        Self {
            series,
            config,
            options,
            visited: HashSet::new(),
            candidates: Vec::new(),
            best: None,
        }
    }

    fn best_aic(&self) -> f64 {
        self.best.as_ref().map_or(f64::INFINITY, |m| m.aic())
    }

    /// Fit `order` once; returns whether it became the new best.
    fn try_order(&mut self, order: ModelOrder) -> bool {
        if !self.visited.insert(order) {
            return false;
        }
        match SarimaModel::fit_with(self.series, order, &self.options) {
            Ok(model) if model.aic().is_finite() => {
                let aic = model.aic();
                debug!(order = %order, aic, "candidate fitted");
                self.candidates.push(CandidateOutcome {
                    order,
                    aic: Some(aic),
                    error: None,
                });
                if aic < self.best_aic() {
                    self.best = Some(model);
                    return true;
                }
                false
            }
            Ok(model) => {
                self.record_failure(order, format!("non-finite AIC {}", model.aic()));
                false
            }
            Err(err) => {
                self.record_failure(order, err.to_string());
                false
            }
        }
    }

    fn record_failure(&mut self, order: ModelOrder, message: String) {
        warn!(order = %order, error = %message, "candidate fit failed, skipping");
        self.candidates.push(CandidateOutcome {
            order,
            aic: None,
            error: Some(message),
        });
    }

    fn budget_left(&self) -> bool {
        self.visited.len() < self.config.max_models
    }

    fn stepwise(&mut self, d: usize, cap_d: usize) {
        let config = self.config;
        let seasonal = usize::from(config.is_seasonal());
        let starts = [
            (2, 2, seasonal, seasonal),
            (0, 0, 0, 0),
            (1, 0, seasonal, 0),
            (0, 1, 0, seasonal),
        ];
        for (p, q, cap_p, cap_q) in starts {
            let clamped = (
                p.min(config.max_p),
                q.min(config.max_q),
                cap_p.min(config.max_cap_p),
                cap_q.min(config.max_cap_q),
            );
            if !self.budget_left() {
                return;
            }
            self.try_order(config.order(clamped, d, cap_d));
        }

        'outer: while let Some(current) = self.best.as_ref().map(|m| m.order()) {
            for neighbour in neighbours(&current, config) {
                if !self.budget_left() {
                    break 'outer;
                }
                if self.try_order(config.order(neighbour, d, cap_d)) {
                    continue 'outer;
                }
            }
            break;
        }
    }

    fn exhaustive(&mut self, d: usize, cap_d: usize) {
        let config = self.config;
        let (max_cap_p, max_cap_q) = if config.is_seasonal() {
            (config.max_cap_p, config.max_cap_q)
        } else {
            (0, 0)
        };
        for p in 0..=config.max_p {
            for q in 0..=config.max_q {
                for cap_p in 0..=max_cap_p {
                    for cap_q in 0..=max_cap_q {
                        self.try_order(config.order((p, q, cap_p, cap_q), d, cap_d));
                    }
                }
            }
        }
    }
}

/// Orders one step away from `current`.
fn neighbours(current: &ModelOrder, config: &SearchConfig) -> Vec<(usize, usize, usize, usize)> {
    let (p, q, cap_p, cap_q) = (
        current.p as i64,
        current.q as i64,
        current.cap_p as i64,
        current.cap_q as i64,
    );
    let mut moves: Vec<(i64, i64, i64, i64)> = vec![
        (p - 1, q, cap_p, cap_q),
        (p + 1, q, cap_p, cap_q),
        (p, q - 1, cap_p, cap_q),
        (p, q + 1, cap_p, cap_q),
        (p - 1, q - 1, cap_p, cap_q),
        (p + 1, q + 1, cap_p, cap_q),
    ];
    if config.is_seasonal() {
        moves.extend([
            (p, q, cap_p - 1, cap_q),
            (p, q, cap_p + 1, cap_q),
            (p, q, cap_p, cap_q - 1),
            (p, q, cap_p, cap_q + 1),
            (p, q, cap_p - 1, cap_q - 1),
            (p, q, cap_p + 1, cap_q + 1),
        ]);
    }
    moves
        .into_iter()
        .filter(|(a, b, c, e)| *a >= 0 && *b >= 0 && *c >= 0 && *e >= 0)
        .map(|(a, b, c, e)| (a as usize, b as usize, c as usize, e as usize))
        .filter(|(a, b, c, e)| config.within_bounds(*a, *b, *c, *e))
        .collect()
}

/// Search for the SARIMA order with the lowest AIC.
///
/// Failed candidate fits are recorded and skipped. The search itself fails
/// only when no candidate could be fitted.
pub fn search_orders(series: &[f64], config: &SearchConfig) -> Result<SearchResult> {
    if config.mode == SearchMode::None {
        return Err(WindError::InvalidParameter(
            "order search requested with mode 'none'".into(),
        ));
    }
    if series.iter().any(|v| !v.is_finite()) {
        return Err(WindError::InvalidParameter(
            "order search input must not contain missing values".into(),
        ));
    }

    let cap_d = if config.is_seasonal() {
        nsdiffs(series, config.period, config.max_cap_d)
    } else {
        0
    };
    let seasonally_differenced = seasonal_difference(series, cap_d, config.period);
    let d = ndiffs(&seasonally_differenced, config.max_d);
    info!(d, cap_d, mode = ?config.mode, "starting order search");

    let mut search = Search::new(series, config);
    match config.mode {
        SearchMode::Stepwise => search.stepwise(d, cap_d),
        SearchMode::Exhaustive => search.exhaustive(d, cap_d),
        SearchMode::None => {}
    }

    let Search {
        candidates, best, ..
    } = search;
    let screened = best.ok_or_else(|| {
        WindError::fit(
            "order search",
            format!("none of {} candidate orders could be fitted", candidates.len()),
        )
    })?;

    let best = if config.approximation {
        let order = screened.order();
        let options = FitOptions::refine_from(screened.raw_parameters().to_vec());
        match SarimaModel::fit_with(series, order, &options) {
            Ok(model) => model,
            Err(err) => {
                warn!(order = %order, error = %err, "full-precision refit failed, keeping screened fit");
                screened
            }
        }
    } else {
        screened
    };

    info!(
        order = %best.order(),
        aic = best.aic(),
        candidates = candidates.len(),
        "order search finished"
    );
    Ok(SearchResult {
        best,
        candidates,
        d,
        cap_d,
    })
}
