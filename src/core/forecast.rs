//! Forecast result structure for holding predictions and prediction intervals.

use chrono::NaiveDateTime;
use serde::Serialize;

/// Prediction interval at one confidence level.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionInterval {
    /// Nominal coverage, e.g. 0.95.
    pub level: f64,
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

/// A forecast: point predictions plus any number of prediction intervals.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Forecast {
    timestamps: Vec<NaiveDateTime>,
    point: Vec<f64>,
    intervals: Vec<PredictionInterval>,
}

impl Forecast {
    /// Create an empty forecast.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a forecast from point predictions.
    pub fn from_values(point: Vec<f64>) -> Self {
        Self {
            timestamps: Vec::new(),
            point,
            intervals: Vec::new(),
        }
    }

    /// Attach an interval; intervals are kept sorted by level.
    pub fn with_interval(mut self, interval: PredictionInterval) -> Self {
        self.intervals.push(interval);
        self.intervals
            .sort_by(|a, b| a.level.partial_cmp(&b.level).unwrap_or(std::cmp::Ordering::Equal));
        self
    }

    /// Attach the timestamps each step refers to.
    pub fn with_timestamps(mut self, timestamps: Vec<NaiveDateTime>) -> Self {
        self.timestamps = timestamps;
        self
    }

    /// Number of forecast steps.
    pub fn horizon(&self) -> usize {
        self.point.len()
    }

    pub fn is_empty(&self) -> bool {
        self.point.is_empty()
    }

    pub fn point(&self) -> &[f64] {
        &self.point
    }

    pub fn timestamps(&self) -> &[NaiveDateTime] {
        &self.timestamps
    }

    /// All intervals, narrowest level first.
    pub fn intervals(&self) -> &[PredictionInterval] {
        &self.intervals
    }

    /// Interval for a given level, if present.
    pub fn interval(&self, level: f64) -> Option<&PredictionInterval> {
        self.intervals
            .iter()
            .find(|interval| (interval.level - level).abs() < 1e-9)
    }

    /// Copy with `offsets[h]` added to the point and both bounds of step `h`.
    ///
    /// Steps beyond `offsets` are left unchanged.
    pub fn shifted(&self, offsets: &[f64]) -> Forecast {
        let shift = |values: &[f64]| {
            values
                .iter()
                .enumerate()
                .map(|(h, v)| v + offsets.get(h).copied().unwrap_or(0.0))
                .collect::<Vec<_>>()
        };
        Forecast {
            timestamps: self.timestamps.clone(),
            point: shift(&self.point),
            intervals: self
                .intervals
                .iter()
                .map(|interval| PredictionInterval {
                    level: interval.level,
                    lower: shift(&interval.lower),
                    upper: shift(&interval.upper),
                })
                .collect(),
        }
    }

    /// Copy with point forecasts and interval bounds floored at zero.
    ///
    /// Wind speed cannot be negative; this only changes what is displayed,
    /// the model that produced the forecast is untouched.
    pub fn clipped_at_zero(&self) -> Forecast {
        let floor = |values: &[f64]| values.iter().map(|v| v.max(0.0)).collect::<Vec<_>>();
        Forecast {
            timestamps: self.timestamps.clone(),
            point: floor(&self.point),
            intervals: self
                .intervals
                .iter()
                .map(|interval| PredictionInterval {
                    level: interval.level,
                    lower: floor(&interval.lower),
                    upper: floor(&interval.upper),
                })
                .collect(),
        }
    }
}
