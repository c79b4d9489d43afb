//! Hourly wind-speed series on a complete, fixed-frequency grid.

use crate::data::Season;
use crate::error::{Result, WindError};
use chrono::{Duration, DurationRound, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// A raw timestamped wind-speed measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub timestamp: NaiveDateTime,
    pub wind_speed: f64,
}

impl Observation {
    pub fn new(timestamp: NaiveDateTime, wind_speed: f64) -> Self {
        Self {
            timestamp,
            wind_speed,
        }
    }
}

/// Mean wind speed for one calendar hour that had at least one observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HourlyRecord {
    /// Top of the hour.
    pub hour_start: NaiveDateTime,
    /// Mean of the hour's observations (NaN when every observation was missing).
    pub wind_speed: f64,
    pub season: Season,
    /// Number of raw observations that fell into the hour.
    pub observation_count: usize,
}

/// Half-open analysis window `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl AnalysisWindow {
    /// Create a window, rejecting empty or inverted ranges.
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self> {
        if start >= end {
            return Err(WindError::InvalidParameter(format!(
                "analysis window start {start} must be before end {end}"
            )));
        }
        Ok(Self { start, end })
    }

    /// Check whether a timestamp lies inside the window.
    pub fn contains(&self, timestamp: &NaiveDateTime) -> bool {
        *timestamp >= self.start && *timestamp < self.end
    }

    /// Number of whole hours covered by the window.
    pub fn hours(&self) -> usize {
        let start = floor_to_hour(self.start);
        let span = self.end - start;
        let hours = span.num_hours();
        let partial = span > Duration::hours(hours);
        (hours + i64::from(partial)).max(0) as usize
    }
}

impl Default for AnalysisWindow {
    /// The study year: 2023-04-01 up to (not including) 2024-04-01.
    fn default() -> Self {
        let midnight = |y, m, d| {
            NaiveDate::from_ymd_opt(y, m, d)
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .unwrap_or_default()
        };
        Self {
            start: midnight(2023, 4, 1),
            end: midnight(2024, 4, 1),
        }
    }
}

/// Truncate a timestamp to the top of its hour.
pub fn floor_to_hour(timestamp: NaiveDateTime) -> NaiveDateTime {
    timestamp
        .duration_trunc(Duration::hours(1))
        .unwrap_or(timestamp)
}

/// An hourly wind-speed series on a complete grid.
///
/// Hours without observations hold `NaN`, so index `i` is always
/// `start + i` hours and daily seasonality keeps its 24-point alignment.
#[derive(Debug, Clone)]
pub struct HourlySeries {
    timestamps: Vec<NaiveDateTime>,
    values: Vec<f64>,
    seasons: Vec<Season>,
    counts: Vec<usize>,
}

impl HourlySeries {
    /// Reindex hourly records onto the complete grid of `window`.
    pub fn from_records(records: &[HourlyRecord], window: &AnalysisWindow) -> Result<Self> {
        let start = floor_to_hour(window.start);
        let n = window.hours();
        Self::build(records, start, n)
    }

    /// Reindex hourly records onto the grid spanning the first to last record.
    pub fn spanning(records: &[HourlyRecord]) -> Result<Self> {
        let (first, last) = match (records.first(), records.last()) {
            (Some(first), Some(last)) => (first.hour_start, last.hour_start),
            _ => return Err(WindError::InsufficientData { needed: 1, got: 0 }),
        };
        let n = (last - first).num_hours().max(0) as usize + 1;
        Self::build(records, first, n)
    }

    /// Build a gap-free series from consecutive hourly values.
    pub fn from_values(start: NaiveDateTime, values: Vec<f64>) -> Self {
        let start = floor_to_hour(start);
        let timestamps: Vec<_> = (0..values.len())
            .map(|i| start + Duration::hours(i as i64))
            .collect();
        let seasons = timestamps.iter().map(Season::of).collect();
        let counts = values
            .iter()
            .map(|v| usize::from(!v.is_nan()))
            .collect();
        Self {
            timestamps,
            values,
            seasons,
            counts,
        }
    }

    fn build(records: &[HourlyRecord], start: NaiveDateTime, n: usize) -> Result<Self> {
        for pair in records.windows(2) {
            if pair[1].hour_start <= pair[0].hour_start {
                return Err(WindError::InvalidParameter(
                    "hourly records must be strictly increasing".to_string(),
                ));
            }
        }

        let timestamps: Vec<_> = (0..n)
            .map(|i| start + Duration::hours(i as i64))
            .collect();
        let seasons = timestamps.iter().map(Season::of).collect();
        let mut values = vec![f64::NAN; n];
        let mut counts = vec![0; n];

        for record in records {
            let offset = (record.hour_start - start).num_hours();
            if offset < 0 || offset as usize >= n || floor_to_hour(record.hour_start) != record.hour_start {
                return Err(WindError::InputRange(format!(
                    "hourly record {} lies outside the series grid starting at {start}",
                    record.hour_start
                )));
            }
            values[offset as usize] = record.wind_speed;
            counts[offset as usize] = record.observation_count;
        }

        Ok(Self {
            timestamps,
            values,
            seasons,
            counts,
        })
    }

    /// Number of grid hours (present or missing).
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn timestamps(&self) -> &[NaiveDateTime] {
        &self.timestamps
    }

    /// Values on the grid, `NaN` for missing hours.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn seasons(&self) -> &[Season] {
        &self.seasons
    }

    /// Raw observations per grid hour.
    pub fn observation_counts(&self) -> &[usize] {
        &self.counts
    }

    /// First grid hour.
    pub fn start(&self) -> Option<NaiveDateTime> {
        self.timestamps.first().copied()
    }

    /// Last grid hour.
    pub fn last_timestamp(&self) -> Option<NaiveDateTime> {
        self.timestamps.last().copied()
    }

    /// Number of grid hours without a value.
    pub fn missing_count(&self) -> usize {
        self.values.iter().filter(|v| !v.is_finite()).count()
    }

    pub fn has_missing_values(&self) -> bool {
        self.values.iter().any(|v| !v.is_finite())
    }

    /// Present (finite) values in grid order.
    pub fn present_values(&self) -> Vec<f64> {
        self.values.iter().copied().filter(|v| v.is_finite()).collect()
    }

    /// Present values paired with their season, in grid order.
    pub fn present_with_seasons(&self) -> Vec<(f64, Season)> {
        self.values
            .iter()
            .zip(self.seasons.iter())
            .filter(|(v, _)| v.is_finite())
            .map(|(&v, &s)| (v, s))
            .collect()
    }

    /// Present values for one season.
    pub fn season_values(&self, season: Season) -> Vec<f64> {
        self.present_with_seasons()
            .into_iter()
            .filter(|(_, s)| *s == season)
            .map(|(v, _)| v)
            .collect()
    }

    /// Copy with missing hours filled by linear interpolation.
    ///
    /// Leading and trailing gaps take the nearest present value.
    pub fn interpolated(&self) -> HourlySeries {
        HourlySeries {
            timestamps: self.timestamps.clone(),
            values: interpolate_series(&self.values),
            seasons: self.seasons.clone(),
            counts: self.counts.clone(),
        }
    }

    /// The last `n` grid hours.
    pub fn tail(&self, n: usize) -> Result<HourlySeries> {
        if n > self.len() {
            return Err(WindError::InputRange(format!(
                "requested the last {n} hours of a {}-hour series",
                self.len()
            )));
        }
        self.slice(self.len() - n, self.len())
    }

    /// Grid hours in `[start, end)`.
    pub fn slice(&self, start: usize, end: usize) -> Result<HourlySeries> {
        if start > end {
            return Err(WindError::InvalidParameter(
                "start must be <= end".to_string(),
            ));
        }
        if end > self.len() {
            return Err(WindError::InputRange(format!(
                "slice end {end} exceeds series length {}",
                self.len()
            )));
        }
        Ok(HourlySeries {
            timestamps: self.timestamps[start..end].to_vec(),
            values: self.values[start..end].to_vec(),
            seasons: self.seasons[start..end].to_vec(),
            counts: self.counts[start..end].to_vec(),
        })
    }

    /// The `horizon` hours following the end of the series.
    pub fn future_timestamps(&self, horizon: usize) -> Vec<NaiveDateTime> {
        match self.last_timestamp() {
            Some(last) => (1..=horizon)
                .map(|h| last + Duration::hours(h as i64))
                .collect(),
            None => Vec::new(),
        }
    }
}

/// Linear interpolation across NaN runs; edges are filled with the nearest value.
fn interpolate_series(values: &[f64]) -> Vec<f64> {
    let mut result = values.to_vec();
    let n = result.len();

    let mut i = 0;
    while i < n {
        if !result[i].is_finite() {
            let start = i;
            while i < n && !result[i].is_finite() {
                i += 1;
            }
            let end = i;

            let left = if start > 0 { Some(result[start - 1]) } else { None };
            let right = if end < n { Some(result[end]) } else { None };

            match (left, right) {
                (Some(l), Some(r)) => {
                    let segments = (end - start + 1) as f64;
                    for (j, idx) in (start..end).enumerate() {
                        let t = (j + 1) as f64 / segments;
                        result[idx] = l + t * (r - l);
                    }
                }
                (Some(l), None) => result[start..end].fill(l),
                (None, Some(r)) => result[start..end].fill(r),
                (None, None) => {}
            }
        } else {
            i += 1;
        }
    }

    result
}
