//! Synthetic wind speeds from the seasonal fits, plus the comparison data
//! used to plot them against the observations.

use crate::core::HourlySeries;
use crate::distribution::seasonal::SeasonalFits;
use crate::distribution::weibull::WeibullFit;
use crate::error::{Result, WindError};
use crate::utils::stats::sorted;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Weibull};
use serde::Serialize;

/// Draw one synthetic speed per present hour of `series`.
///
/// Each draw uses the parameters of that hour's season, so the output has the
/// length and season alignment of [`HourlySeries::present_with_seasons`].
/// The same seed always yields the same values.
pub fn simulate_seasonal(series: &HourlySeries, fits: &SeasonalFits, seed: u64) -> Result<Vec<f64>> {
    let mut samplers = Vec::with_capacity(fits.len());
    for (season, fit) in fits {
        // rand_distr takes (scale, shape)
        let sampler = Weibull::new(fit.scale, fit.shape).map_err(|e| {
            WindError::fit(season.name(), format!("cannot sample from fit: {e}"))
        })?;
        samplers.push((*season, sampler));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    series
        .present_with_seasons()
        .into_iter()
        .map(|(_, season)| {
            samplers
                .iter()
                .find(|(s, _)| *s == season)
                .map(|(_, sampler)| sampler.sample(&mut rng))
                .ok_or_else(|| WindError::fit(season.name(), "no fitted parameters for season"))
        })
        .collect()
}

/// Sorted observed values against sorted simulated values.
///
/// The longer input is truncated to the shorter one.
pub fn qq_pairs(observed: &[f64], simulated: &[f64]) -> Vec<(f64, f64)> {
    sorted(observed)
        .into_iter()
        .zip(sorted(simulated))
        .collect()
}

/// Theoretical Weibull quantiles against sorted observations, using
/// plotting positions `(i - 0.5) / n`.
pub fn theoretical_qq(observed: &[f64], fit: &WeibullFit) -> Vec<(f64, f64)> {
    let n = observed.len() as f64;
    sorted(observed)
        .into_iter()
        .enumerate()
        .map(|(i, x)| (fit.quantile((i as f64 + 0.5) / n), x))
        .collect()
}

/// Histogram densities on fixed bin edges.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    /// `bins + 1` increasing edges.
    pub edges: Vec<f64>,
    /// Density per bin: count / (n · width).
    pub density: Vec<f64>,
}

impl Histogram {
    /// Bin mid-points.
    pub fn centers(&self) -> Vec<f64> {
        self.edges.windows(2).map(|e| 0.5 * (e[0] + e[1])).collect()
    }
}

/// Observed and simulated densities on shared edges.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DensityComparison {
    pub edges: Vec<f64>,
    pub observed: Vec<f64>,
    pub simulated: Vec<f64>,
}

fn edges(lo: f64, hi: f64, bins: usize) -> Vec<f64> {
    let hi = if hi > lo { hi } else { lo + 1.0 };
    let width = (hi - lo) / bins as f64;
    (0..=bins).map(|i| lo + width * i as f64).collect()
}

fn densities(values: &[f64], edges: &[f64]) -> Vec<f64> {
    let bins = edges.len() - 1;
    let lo = edges[0];
    let width = edges[1] - edges[0];
    let mut counts = vec![0usize; bins];
    let mut total = 0usize;

    for &v in values.iter().filter(|v| v.is_finite()) {
        total += 1;
        let idx = ((v - lo) / width).floor();
        if idx < 0.0 {
            continue;
        }
        // The last edge is inclusive.
        let idx = (idx as usize).min(bins - 1);
        if v <= edges[bins] {
            counts[idx] += 1;
        }
    }

    let denom = total.max(1) as f64 * width;
    counts.into_iter().map(|c| c as f64 / denom).collect()
}

/// Density histogram of the finite values, from 0 to the maximum.
pub fn histogram(values: &[f64], bins: usize) -> Result<Histogram> {
    if bins == 0 {
        return Err(WindError::InvalidParameter("histogram needs at least one bin".into()));
    }
    let max = values.iter().copied().filter(|v| v.is_finite()).fold(0.0, f64::max);
    let edges = edges(0.0, max, bins);
    let density = densities(values, &edges);
    Ok(Histogram { edges, density })
}

/// Densities of observed and simulated speeds over one shared set of edges.
pub fn density_comparison(observed: &[f64], simulated: &[f64], bins: usize) -> Result<DensityComparison> {
    if bins == 0 {
        return Err(WindError::InvalidParameter("histogram needs at least one bin".into()));
    }
    let max = observed
        .iter()
        .chain(simulated)
        .copied()
        .filter(|v| v.is_finite())
        .fold(0.0, f64::max);
    let edges = edges(0.0, max, bins);
    Ok(DensityComparison {
        observed: densities(observed, &edges),
        simulated: densities(simulated, &edges),
        edges,
    })
}

/// Fitted Weibull density evaluated on `grid`.
pub fn fitted_density(fit: &WeibullFit, grid: &[f64]) -> Result<Vec<f64>> {
    fit.pdf_on(grid)
}

/// `points` evenly spaced values from 0 to `upper` inclusive.
pub fn density_grid(upper: f64, points: usize) -> Vec<f64> {
    if points < 2 {
        return vec![0.0; points];
    }
    let step = upper / (points - 1) as f64;
    (0..points).map(|i| step * i as f64).collect()
}
