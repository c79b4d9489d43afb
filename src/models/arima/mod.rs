//! Seasonal ARIMA models for hourly wind speed.
//!
//! This module provides:
//! - SARIMA(p, d, q)(P, D, Q)\[s\] fitted by conditional sum of squares
//! - Optional season-indicator regressors removed before the fit
//! - Stepwise and exhaustive order search by AIC
//! - Manual refinement with residual diagnostics
//! - A frozen model used only for forecasting

mod diff;
mod model;
pub mod polynomial;
mod refine;
mod search;

pub use diff::{difference, differencing_loss, full_difference, seasonal_difference};
pub use model::{
    FitOptions, FrozenModel, ModelOrder, SarimaCoefficients, SarimaModel, SeasonRegression,
};
pub use refine::{diagnose, refine, Refinement, ResidualDiagnostics, LJUNG_BOX_LAGS};
pub use search::{
    ndiffs, nsdiffs, search_orders, CandidateOutcome, SearchConfig, SearchMode, SearchResult,
    SEASONAL_VARIANCE_RATIO,
};
