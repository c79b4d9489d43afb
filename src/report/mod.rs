//! Printed summary tables and exported plot data.

pub mod export;
pub mod tables;

pub use export::{export_all, write_correlogram, write_forecast, ExportOptions, Summary};
pub use tables::render;
