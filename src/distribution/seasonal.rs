//! Per-season Weibull fits and the annual-versus-seasonal comparison.

use crate::core::HourlySeries;
use crate::data::Season;
use crate::distribution::weibull::{fit_weibull, WeibullFit, ZeroPolicy};
use crate::error::Result;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// One independent fit per season present in the data.
pub type SeasonalFits = BTreeMap<Season, WeibullFit>;

/// Present hourly values grouped by season label.
///
/// Every present value lands in exactly one group.
pub fn partition_by_season(series: &HourlySeries) -> BTreeMap<Season, Vec<f64>> {
    let mut groups: BTreeMap<Season, Vec<f64>> = BTreeMap::new();
    for (value, season) in series.present_with_seasons() {
        groups.entry(season).or_default().push(value);
    }
    groups
}

/// Fit a Weibull distribution to each season independently.
///
/// Seasons with no hours in the series are skipped. A season whose fit fails
/// aborts the whole operation with that season named in the error.
pub fn fit_seasonal(series: &HourlySeries, policy: ZeroPolicy) -> Result<SeasonalFits> {
    let groups = partition_by_season(series);
    let mut fits = SeasonalFits::new();

    for season in Season::ALL {
        let Some(values) = groups.get(&season) else {
            warn!(season = %season, "no hours for season, skipping fit");
            continue;
        };
        let fit = fit_weibull(values, policy, season.name())?;
        info!(
            season = %season,
            shape = fit.shape,
            scale = fit.scale,
            n = fit.n,
            zeros_excluded = fit.zeros_excluded,
            "seasonal weibull fit"
        );
        fits.insert(season, fit);
    }

    Ok(fits)
}

/// Side-by-side totals for the single annual fit and the seasonal fits.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FitComparison {
    pub annual_log_likelihood: f64,
    pub seasonal_log_likelihood: f64,
    pub annual_aic: f64,
    pub seasonal_aic: f64,
    pub annual_parameters: usize,
    pub seasonal_parameters: usize,
    /// `seasonal_log_likelihood - annual_log_likelihood`.
    pub log_likelihood_gain: f64,
    /// `seasonal_aic - annual_aic`; negative favours the seasonal model.
    pub aic_difference: f64,
    pub annual_n: usize,
    pub seasonal_n: usize,
}

/// Sum the seasonal log-likelihoods and AICs and set them against the annual fit.
pub fn compare_fits(annual: &WeibullFit, seasonal: &SeasonalFits) -> FitComparison {
    let seasonal_log_likelihood: f64 = seasonal.values().map(|f| f.log_likelihood).sum();
    let seasonal_aic: f64 = seasonal.values().map(|f| f.aic).sum();

    FitComparison {
        annual_log_likelihood: annual.log_likelihood,
        seasonal_log_likelihood,
        annual_aic: annual.aic,
        seasonal_aic,
        annual_parameters: 2,
        seasonal_parameters: 2 * seasonal.len(),
        log_likelihood_gain: seasonal_log_likelihood - annual.log_likelihood,
        aic_difference: seasonal_aic - annual.aic,
        annual_n: annual.n,
        seasonal_n: seasonal.values().map(|f| f.n).sum(),
    }
}
