//! Property-based tests for the wind-resource pipeline.
//!
//! These tests verify invariants that should hold for all valid inputs,
//! using randomly generated wind-speed data.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use proptest::prelude::*;
use wind_resource::core::{HourlySeries, Observation};
use wind_resource::data::aggregate::records_as_observations;
use wind_resource::data::{aggregate_hourly, Season};
use wind_resource::distribution::{
    compare_fits, fit_seasonal, fit_weibull, partition_by_season, simulate_seasonal, ZeroPolicy,
};
use wind_resource::models::arima::{ModelOrder, SarimaCoefficients, SarimaModel};

fn base_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2023, 4, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

/// Strategy for positive wind speeds.
fn speeds_strategy(min_len: usize, max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(0.1..30.0_f64, min_len..max_len)
}

/// Strategy for irregular observations: (minute offset, speed).
fn observations_strategy() -> impl Strategy<Value = Vec<Observation>> {
    prop::collection::vec((0i64..60 * 24 * 30, 0.0..25.0_f64), 1..300).prop_map(|raw| {
        let base = base_time();
        let mut observations: Vec<Observation> = raw
            .into_iter()
            .map(|(minutes, speed)| Observation::new(base + Duration::minutes(minutes), speed))
            .collect();
        observations.sort_by_key(|o| o.timestamp);
        observations
    })
}

/// Hourly series spread over the year, with some gaps.
fn series_strategy() -> impl Strategy<Value = HourlySeries> {
    (prop::collection::vec(prop::option::weighted(0.9, 0.5..20.0_f64), 200..400), 0i64..8000)
        .prop_map(|(values, offset)| {
            let values = values.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect();
            HourlySeries::from_values(base_time() + Duration::hours(offset), values)
        })
}

/// Gappy series straddling the Autumn/Winter boundary with both seasons well populated.
fn two_season_series_strategy() -> impl Strategy<Value = HourlySeries> {
    (prop::collection::vec(prop::option::weighted(0.9, 0.5..20.0_f64), 200..400), 0i64..72)
        .prop_map(|(values, offset)| {
            let values = values.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect();
            let start = NaiveDate::from_ymd_opt(2023, 5, 25)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap();
            HourlySeries::from_values(start + Duration::hours(offset), values)
        })
}

// =============================================================================
// Property: Weibull fits on positive input have positive parameters
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn weibull_parameters_are_positive(values in speeds_strategy(2, 300)) {
        let fit = fit_weibull(&values, ZeroPolicy::Drop, "annual").unwrap();
        prop_assert!(fit.shape > 0.0 && fit.shape.is_finite());
        prop_assert!(fit.scale > 0.0 && fit.scale.is_finite());
        prop_assert_eq!(fit.n, values.len());
    }

    #[test]
    fn constant_speed_fits_are_finite(v in 0.5..25.0_f64, n in 2usize..100) {
        let fit = fit_weibull(&vec![v; n], ZeroPolicy::Drop, "annual").unwrap();
        prop_assert!(fit.shape.is_finite() && fit.shape > 0.0);
        prop_assert!((fit.scale - v).abs() < 1e-6 * v.max(1.0));
    }
}

// =============================================================================
// Property: Aggregation is deterministic and idempotent
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn aggregation_is_deterministic(observations in observations_strategy()) {
        prop_assert_eq!(aggregate_hourly(&observations), aggregate_hourly(&observations));
    }

    #[test]
    fn aggregation_is_idempotent(observations in observations_strategy()) {
        let once = aggregate_hourly(&observations);
        let twice = aggregate_hourly(&records_as_observations(&once));

        prop_assert_eq!(once.len(), twice.len());
        for (a, b) in once.iter().zip(&twice) {
            prop_assert_eq!(a.hour_start, b.hour_start);
            prop_assert!((a.wind_speed - b.wind_speed).abs() < 1e-12);
        }
    }

    #[test]
    fn hourly_records_are_strictly_increasing(observations in observations_strategy()) {
        let records = aggregate_hourly(&observations);
        for pair in records.windows(2) {
            prop_assert!(pair[0].hour_start < pair[1].hour_start);
        }
        let total: usize = records.iter().map(|r| r.observation_count).sum();
        prop_assert_eq!(total, observations.len());
    }
}

// =============================================================================
// Property: Seasons are total, exclusive, and partition the present values
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn every_month_has_exactly_one_season(month in 1u32..=12) {
        let season = Season::from_month(month);
        let matches = Season::ALL.iter().filter(|s| **s == season).count();
        prop_assert_eq!(matches, 1);
    }

    #[test]
    fn seasonal_partition_covers_present_values(series in series_strategy()) {
        let groups = partition_by_season(&series);
        let total: usize = groups.values().map(Vec::len).sum();
        prop_assert_eq!(total, series.present_values().len());
        for (season, values) in &groups {
            prop_assert_eq!(values, &series.season_values(*season));
        }
    }

    #[test]
    fn seasonal_comparison_is_deterministic(series in two_season_series_strategy()) {
        let annual = fit_weibull(&series.present_values(), ZeroPolicy::Drop, "annual").unwrap();
        let seasonal = fit_seasonal(&series, ZeroPolicy::Drop).unwrap();
        prop_assert_eq!(compare_fits(&annual, &seasonal), compare_fits(&annual, &seasonal));
    }

    #[test]
    fn simulation_is_reproducible(series in two_season_series_strategy(), seed in any::<u64>()) {
        let fits = fit_seasonal(&series, ZeroPolicy::Drop).unwrap();
        let a = simulate_seasonal(&series, &fits, seed).unwrap();
        let b = simulate_seasonal(&series, &fits, seed).unwrap();
        prop_assert_eq!(a.len(), series.present_values().len());
        prop_assert_eq!(a, b);
    }
}

// =============================================================================
// Property: Forecast intervals are nested and non-negative after clipping
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(30))]

    #[test]
    fn forecast_intervals_are_nested(
        values in speeds_strategy(40, 120),
        phi in -0.9..0.9_f64,
        horizon in 1usize..60
    ) {
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        let model = SarimaModel::from_coefficients(
            &values,
            ModelOrder::new((1, 0, 0), (0, 0, 0), 0),
            SarimaCoefficients {
                ar: vec![phi],
                ma: vec![],
                seasonal_ar: vec![],
                seasonal_ma: vec![],
                mean,
            },
        )
        .unwrap();
        let forecast = model.forecast(horizon, &[0.80, 0.95]).unwrap().clipped_at_zero();
        let i80 = forecast.interval(0.80).unwrap();
        let i95 = forecast.interval(0.95).unwrap();

        prop_assert_eq!(forecast.horizon(), horizon);
        for h in 0..horizon {
            let point = forecast.point()[h];
            prop_assert!(i95.lower[h] <= i80.lower[h]);
            prop_assert!(i80.lower[h] <= point);
            prop_assert!(point <= i80.upper[h]);
            prop_assert!(i80.upper[h] <= i95.upper[h]);
            prop_assert!(i95.lower[h] >= 0.0);
        }
    }
}
