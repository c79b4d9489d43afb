//! Numerical helpers shared by the distribution and time-series code.

pub mod ols;
pub mod optimization;
pub mod stats;

pub use ols::{ols_fit, OlsFit};
pub use optimization::{nelder_mead, newton_bisect, NelderMeadConfig, NelderMeadResult, RootResult};
pub use stats::{cdf_normal, mean, quantile, quantile_normal, std_dev, variance};
