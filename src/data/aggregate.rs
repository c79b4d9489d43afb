//! Bucketing of irregular observations into hourly means.

use crate::core::{floor_to_hour, HourlyRecord, Observation};
use crate::data::Season;
use std::collections::BTreeMap;

/// Average observations per calendar hour.
///
/// Emits one record per hour that has at least one observation, in strictly
/// increasing order. Missing (NaN) speeds are ignored in the mean; an hour whose
/// observations are all missing keeps a NaN mean. Hours without observations
/// produce no record.
pub fn aggregate_hourly(observations: &[Observation]) -> Vec<HourlyRecord> {
    // hour -> (sum, valid count, total count)
    let mut buckets: BTreeMap<_, (f64, usize, usize)> = BTreeMap::new();

    for obs in observations {
        let entry = buckets
            .entry(floor_to_hour(obs.timestamp))
            .or_insert((0.0, 0, 0));
        if obs.wind_speed.is_finite() {
            entry.0 += obs.wind_speed;
            entry.1 += 1;
        }
        entry.2 += 1;
    }

    buckets
        .into_iter()
        .map(|(hour_start, (sum, valid, total))| HourlyRecord {
            hour_start,
            wind_speed: if valid > 0 { sum / valid as f64 } else { f64::NAN },
            season: Season::of(&hour_start),
            observation_count: total,
        })
        .collect()
}

/// Distribution of observations per hour: count -> number of hours.
pub fn observation_count_distribution(records: &[HourlyRecord]) -> BTreeMap<usize, usize> {
    let mut distribution = BTreeMap::new();
    for record in records {
        *distribution.entry(record.observation_count).or_insert(0) += 1;
    }
    distribution
}

/// Hourly records carried back to one observation per hour.
pub fn records_as_observations(records: &[HourlyRecord]) -> Vec<Observation> {
    records
        .iter()
        .map(|r| Observation::new(r.hour_start, r.wind_speed))
        .collect()
}
