//! Core data structures: observations, hourly series and forecasts.

mod forecast;
mod time_series;

pub use forecast::{Forecast, PredictionInterval};
pub use time_series::{floor_to_hour, AnalysisWindow, HourlyRecord, HourlySeries, Observation};
