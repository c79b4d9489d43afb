//! Serial-correlation features used for model identification and diagnostics.

pub mod autocorrelation;

pub use autocorrelation::{acf, autocorrelation, confidence_band, pacf, pacf_from_acf, Correlogram};
