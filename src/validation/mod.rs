//! Statistical validation tests for time series models.
//!
//! Provides stationarity tests for model selection and residual diagnostics
//! for fitted models.
//!
//! # Example
//!
//! ```
//! use wind_resource::validation::{adf_test, kpss_test, ljung_box};
//!
//! let series: Vec<f64> = (0..200).map(|i| 5.0 + ((i * 7) % 13) as f64 * 0.1).collect();
//! let adf = adf_test(&series, None).unwrap();
//! let kpss = kpss_test(&series, None).unwrap();
//! println!("ADF p = {:.3}, KPSS stat = {:.3}", adf.p_value, kpss.statistic);
//!
//! let lb = ljung_box(&series, Some(10), 0);
//! println!("Ljung-Box Q = {:.1}", lb.statistic);
//! ```

pub mod stationarity;

pub use residual_tests::{ljung_box, LjungBoxResult};
pub use stationarity::{
    adf_critical_values, adf_test, default_adf_max_lags, kpss_test, mackinnon_p_value,
    CriticalValues, StationarityResult,
};
