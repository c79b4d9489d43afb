//! Weibull characterisation of the wind resource.
//!
//! - [`weibull`]: maximum-likelihood fit, log-likelihood and AIC
//! - [`seasonal`]: independent per-season fits and the annual comparison
//! - [`goodness_of_fit`]: Anderson-Darling test with estimated parameters
//! - [`simulate`]: seasonal simulation and plotting data

pub mod goodness_of_fit;
pub mod seasonal;
pub mod simulate;
pub mod weibull;

pub use goodness_of_fit::{anderson_darling, weibull_goodness_of_fit, GoodnessOfFit};
pub use seasonal::{compare_fits, fit_seasonal, partition_by_season, FitComparison, SeasonalFits};
pub use simulate::{
    density_comparison, density_grid, fitted_density, histogram, qq_pairs, simulate_seasonal,
    theoretical_qq, DensityComparison, Histogram,
};
pub use weibull::{
    aic, fit_weibull, prepare_sample, weibull_log_likelihood, PreparedSample, WeibullFit,
    ZeroPolicy, MAX_SHAPE,
};
