//! Forecaster trait shared by fitted models.

use crate::core::Forecast;
use crate::error::Result;

/// Common interface for fitted forecasting models.
///
/// This trait is object-safe and can be used with `Box<dyn Forecaster>`.
pub trait Forecaster {
    /// Model name, e.g. `SARIMA(2,0,1)(1,0,1)[24]`.
    fn name(&self) -> String;

    /// Point predictions for the specified horizon.
    fn predict(&self, horizon: usize) -> Result<Forecast> {
        self.predict_with_intervals(horizon, &[])
    }

    /// Predictions with one interval per level in `levels`.
    fn predict_with_intervals(&self, horizon: usize, levels: &[f64]) -> Result<Forecast>;

    /// In-sample one-step residuals.
    fn residuals(&self) -> &[f64];
}

/// Type alias for boxed forecaster trait objects.
pub type BoxedForecaster = Box<dyn Forecaster>;
