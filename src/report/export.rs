//! Plot-ready CSV files and the JSON run summary.

use crate::core::{AnalysisWindow, Forecast, PredictionInterval};
use crate::distribution::{
    density_comparison, density_grid, fitted_density, histogram, qq_pairs, theoretical_qq,
    FitComparison, SeasonalFits, WeibullFit,
};
use crate::error::Result;
use crate::features::Correlogram;
use crate::models::arima::{ModelOrder, SarimaCoefficients, SeasonRegression};
use crate::pipeline::AnalysisReport;
use crate::validation::{LjungBoxResult, StationarityResult};
use serde::Serialize;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Points on the grid of the fitted density curves.
const DENSITY_POINTS: usize = 200;

fn cell(value: f64) -> String {
    if value.is_finite() {
        format!("{value:.6}")
    } else {
        String::new()
    }
}

fn write_csv<I>(path: &Path, header: &[String], rows: I) -> Result<()>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(header)?;
    for row in rows {
        writer.write_record(&row)?;
    }
    writer.flush()?;
    debug!(path = %path.display(), "wrote plot data");
    Ok(())
}

fn header(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

fn interval_header(forecast: &Forecast) -> Vec<String> {
    forecast
        .intervals()
        .iter()
        .flat_map(|i| {
            let pct = (i.level * 100.0).round();
            [format!("lower_{pct}"), format!("upper_{pct}")]
        })
        .collect()
}

fn interval_cells(intervals: &[PredictionInterval], h: usize) -> Vec<String> {
    intervals
        .iter()
        .flat_map(|i| [cell(i.lower[h]), cell(i.upper[h])])
        .collect()
}

/// One row per forecast step, bounds floored at zero.
pub fn write_forecast(path: &Path, forecast: &Forecast) -> Result<()> {
    let display = forecast.clipped_at_zero();
    let mut names = header(&["timestamp", "forecast"]);
    names.extend(interval_header(&display));
    let rows = (0..display.horizon()).map(|h| {
        let mut row = vec![
            display
                .timestamps()
                .get(h)
                .map(|t| t.to_string())
                .unwrap_or_default(),
            cell(display.point()[h]),
        ];
        row.extend(interval_cells(display.intervals(), h));
        row
    });
    write_csv(path, &names, rows)
}

pub fn write_correlogram(path: &Path, correlogram: &Correlogram) -> Result<()> {
    let rows = correlogram.lags.iter().map(|&lag| {
        vec![
            lag.to_string(),
            cell(correlogram.acf[lag]),
            cell(correlogram.pacf[lag]),
            cell(correlogram.band),
        ]
    });
    write_csv(path, &header(&["lag", "acf", "pacf", "band"]), rows)
}

fn write_hourly_series(dir: &Path, report: &AnalysisReport) -> Result<PathBuf> {
    let path = dir.join("hourly_series.csv");
    let series = &report.series;
    let filled = series.interpolated();
    let rows = (0..series.len()).map(|i| {
        vec![
            series.timestamps()[i].to_string(),
            series.seasons()[i].name().to_string(),
            cell(series.values()[i]),
            cell(filled.values()[i]),
            series.observation_counts()[i].to_string(),
        ]
    });
    write_csv(
        &path,
        &header(&["timestamp", "season", "wind_speed", "interpolated", "observations"]),
        rows,
    )?;
    Ok(path)
}

fn write_histogram_fit(dir: &Path, report: &AnalysisReport, bins: usize) -> Result<PathBuf> {
    let path = dir.join("histogram_fit.csv");
    let values = report.series.present_values();
    let hist = histogram(&values, bins)?;
    let centers = hist.centers();
    let pdf = fitted_density(&report.annual, &centers)?;
    let rows = (0..hist.density.len()).map(|i| {
        vec![
            cell(hist.edges[i]),
            cell(hist.edges[i + 1]),
            cell(hist.density[i]),
            cell(pdf[i]),
        ]
    });
    write_csv(
        &path,
        &header(&["bin_lower", "bin_upper", "observed_density", "weibull_density"]),
        rows,
    )?;
    Ok(path)
}

fn write_season_qq(dir: &Path, report: &AnalysisReport) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    for (season, fit) in &report.seasonal {
        let path = dir.join(format!("qq_{}.csv", season.name().to_lowercase()));
        let pairs = theoretical_qq(&report.series.season_values(*season), fit);
        write_csv(
            &path,
            &header(&["theoretical", "observed"]),
            pairs.into_iter().map(|(t, o)| vec![cell(t), cell(o)]),
        )?;
        written.push(path);
    }
    Ok(written)
}

fn write_seasonal_density(dir: &Path, report: &AnalysisReport) -> Result<PathBuf> {
    let path = dir.join("seasonal_density.csv");
    let upper = report
        .series
        .present_values()
        .into_iter()
        .fold(0.0, f64::max)
        .max(1.0);
    let grid = density_grid(upper, DENSITY_POINTS);
    let mut names = header(&["wind_speed", "annual"]);
    let mut columns = vec![fitted_density(&report.annual, &grid)?];
    for (season, fit) in &report.seasonal {
        names.push(season.name().to_lowercase());
        columns.push(fitted_density(fit, &grid)?);
    }
    let rows = grid.iter().enumerate().map(|(i, x)| {
        std::iter::once(cell(*x))
            .chain(columns.iter().map(|c| cell(c[i])))
            .collect::<Vec<_>>()
    });
    write_csv(&path, &names, rows)?;
    Ok(path)
}

fn write_simulation(dir: &Path, report: &AnalysisReport, bins: usize) -> Result<Vec<PathBuf>> {
    let observed = report.series.present_values();
    let density_path = dir.join("simulated_vs_actual.csv");
    let comparison = density_comparison(&observed, &report.simulated, bins)?;
    let rows = (0..comparison.observed.len()).map(|i| {
        vec![
            cell(comparison.edges[i]),
            cell(comparison.edges[i + 1]),
            cell(comparison.observed[i]),
            cell(comparison.simulated[i]),
        ]
    });
    write_csv(
        &density_path,
        &header(&["bin_lower", "bin_upper", "observed_density", "simulated_density"]),
        rows,
    )?;

    let qq_path = dir.join("simulated_qq.csv");
    write_csv(
        &qq_path,
        &header(&["observed", "simulated"]),
        qq_pairs(&observed, &report.simulated)
            .into_iter()
            .map(|(o, s)| vec![cell(o), cell(s)]),
    )?;
    Ok(vec![density_path, qq_path])
}

fn write_residuals(dir: &Path, report: &AnalysisReport) -> Result<PathBuf> {
    let path = dir.join("residuals.csv");
    let filled = report.series.interpolated();
    let sarima = report.model.model();
    let offsets = report.model.regression_means(filled.seasons());
    let fitted = sarima.fitted_values();
    let residuals = sarima.aligned_residuals();
    let rows = (0..filled.len()).map(|i| {
        vec![
            filled.timestamps()[i].to_string(),
            cell(filled.values()[i]),
            cell(fitted[i] + offsets[i]),
            cell(residuals[i]),
        ]
    });
    write_csv(&path, &header(&["timestamp", "actual", "fitted", "residual"]), rows)?;
    Ok(path)
}

fn write_recent_forecast(dir: &Path, report: &AnalysisReport) -> Result<PathBuf> {
    let path = dir.join("forecast_recent.csv");
    let display = report.recent_forecast.clipped_at_zero();
    let history = &report.recent_history;
    let bound_columns = 2 * display.intervals().len();

    let mut names = header(&["timestamp", "kind", "wind_speed"]);
    names.extend(interval_header(&display));
    let past = (0..history.len()).map(|i| {
        let mut row = vec![
            history.timestamps()[i].to_string(),
            "history".to_string(),
            cell(history.values()[i]),
        ];
        row.extend(std::iter::repeat(String::new()).take(bound_columns));
        row
    });
    let future = (0..display.horizon()).map(|h| {
        let mut row = vec![
            display
                .timestamps()
                .get(h)
                .map(|t| t.to_string())
                .unwrap_or_default(),
            "forecast".to_string(),
            cell(display.point()[h]),
        ];
        row.extend(interval_cells(display.intervals(), h));
        row
    });
    let rows: Vec<Vec<String>> = past.chain(future).collect();
    write_csv(&path, &names, rows)?;
    Ok(path)
}

/// Machine-readable digest of a run.
#[derive(Debug, Serialize)]
pub struct Summary<'a> {
    pub input: &'a Path,
    pub window: AnalysisWindow,
    pub rows_read: usize,
    pub rows_dropped: usize,
    pub rows_outside_window: usize,
    pub hourly_records: usize,
    pub missing_hours: usize,
    pub annual_fit: &'a WeibullFit,
    pub seasonal_fits: &'a SeasonalFits,
    pub comparison: &'a FitComparison,
    pub anderson_darling: f64,
    pub anderson_darling_p_value: String,
    pub stationarity: &'a StationarityResult,
    pub order: ModelOrder,
    pub order_label: String,
    pub coefficients: &'a SarimaCoefficients,
    pub season_regression: Option<&'a SeasonRegression>,
    pub sigma2: f64,
    pub aic: f64,
    pub bic: f64,
    pub ljung_box: &'a [LjungBoxResult],
    pub forecast: &'a Forecast,
}

impl<'a> Summary<'a> {
    pub fn new(report: &'a AnalysisReport, input: &'a Path, window: AnalysisWindow) -> Self {
        let sarima = report.model.model();
        Self {
            input,
            window,
            rows_read: report.load.rows_read,
            rows_dropped: report.load.dropped_rows,
            rows_outside_window: report.load.outside_window,
            hourly_records: report.hourly_records,
            missing_hours: report.series.missing_count(),
            annual_fit: &report.annual,
            seasonal_fits: &report.seasonal,
            comparison: &report.comparison,
            anderson_darling: report.goodness_of_fit.adjusted_statistic,
            anderson_darling_p_value: report.goodness_of_fit.p_value_label(),
            stationarity: &report.stationarity,
            order: report.model.order(),
            order_label: report.model.order().to_string(),
            coefficients: sarima.coefficients(),
            season_regression: report.model.regression(),
            sigma2: sarima.sigma2(),
            aic: sarima.aic(),
            bic: sarima.bic(),
            ljung_box: &report.diagnostics.ljung_box,
            forecast: &report.forecast,
        }
    }
}

/// Where exported files go and how histograms are binned.
#[derive(Debug, Clone)]
pub struct ExportOptions<'a> {
    pub output_dir: &'a Path,
    pub input: &'a Path,
    pub window: AnalysisWindow,
    pub histogram_bins: usize,
}

/// Write every plot-data file plus `summary.json`; returns the paths written.
pub fn export_all(report: &AnalysisReport, options: &ExportOptions<'_>) -> Result<Vec<PathBuf>> {
    let dir = options.output_dir;
    fs::create_dir_all(dir)?;
    let bins = options.histogram_bins;

    let mut written = vec![
        write_hourly_series(dir, report)?,
        write_histogram_fit(dir, report, bins)?,
    ];
    written.extend(write_season_qq(dir, report)?);
    written.push(write_seasonal_density(dir, report)?);
    written.extend(write_simulation(dir, report, bins)?);

    let acf_path = dir.join("acf_pacf.csv");
    write_correlogram(&acf_path, &report.correlogram)?;
    written.push(acf_path);
    written.push(write_residuals(dir, report)?);
    let residual_acf = dir.join("residual_acf.csv");
    write_correlogram(&residual_acf, &report.diagnostics.correlogram)?;
    written.push(residual_acf);

    let forecast_path = dir.join("forecast_48h.csv");
    write_forecast(&forecast_path, &report.forecast)?;
    written.push(forecast_path);
    written.push(write_recent_forecast(dir, report)?);

    let summary_path = dir.join("summary.json");
    let summary = Summary::new(report, options.input, options.window);
    let file = BufWriter::new(File::create(&summary_path)?);
    serde_json::to_writer_pretty(file, &summary)?;
    written.push(summary_path);

    info!(dir = %dir.display(), files = written.len(), "exported plot data");
    Ok(written)
}
