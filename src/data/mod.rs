//! Input handling: CSV loading, cleaning, hourly aggregation and season labels.

pub mod aggregate;
pub mod loader;
mod season;

pub use aggregate::{aggregate_hourly, observation_count_distribution};
pub use loader::{
    load_observations, parse_timestamp, read_observations, LoadOptions, LoadReport, LoadedData,
    RowError,
};
pub use season::Season;
