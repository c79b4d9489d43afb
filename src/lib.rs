//! # wind-resource
//!
//! Wind-resource characterisation and short-term forecasting from hourly
//! wind-speed observations.
//!
//! The pipeline loads irregular observations, aggregates them onto a complete
//! hourly grid, fits annual and seasonal Weibull distributions, simulates the
//! seasonal model, and forecasts the next 48 hours with a frozen seasonal
//! ARIMA model.
//!
//! ```no_run
//! use wind_resource::config::AnalysisConfig;
//! use wind_resource::pipeline;
//!
//! let report = pipeline::run(&AnalysisConfig::default())?;
//! println!("annual shape {:.2}", report.annual.shape);
//! # Ok::<(), wind_resource::WindError>(())
//! ```

#![allow(clippy::too_many_arguments)]
#![allow(clippy::needless_range_loop)]

pub mod config;
pub mod core;
pub mod data;
pub mod distribution;
pub mod error;
pub mod features;
pub mod models;
pub mod pipeline;
pub mod report;
pub mod utils;
pub mod validation;

pub use error::{Result, WindError};

pub mod prelude {
    pub use crate::config::AnalysisConfig;
    pub use crate::core::{Forecast, HourlySeries};
    pub use crate::data::Season;
    pub use crate::distribution::{fit_weibull, WeibullFit, ZeroPolicy};
    pub use crate::error::{Result, WindError};
    pub use crate::models::arima::{FrozenModel, ModelOrder, SarimaModel};
    pub use crate::models::Forecaster;
}
