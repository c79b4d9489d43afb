//! Plain-text summary tables for the terminal.

use crate::core::Forecast;
use crate::data::LoadReport;
use crate::distribution::{FitComparison, GoodnessOfFit, SeasonalFits, WeibullFit};
use crate::models::arima::{FrozenModel, ResidualDiagnostics, SearchResult};
use crate::pipeline::AnalysisReport;
use crate::validation::StationarityResult;
use std::collections::BTreeMap;
use std::fmt::Write;

fn rule(width: usize) -> String {
    format!("{:-<width$}\n", "")
}

fn heading(title: &str) -> String {
    format!("\n=== {title} ===\n")
}

pub fn load_table(load: &LoadReport, hourly_records: usize, grid_hours: usize, missing: usize) -> String {
    let mut out = heading("Input");
    let rows = [
        ("rows read", load.rows_read),
        ("rows dropped (unparseable)", load.dropped_rows),
        ("rows outside window", load.outside_window),
        ("rows with empty speed", load.missing_speeds),
        ("hours with data", hourly_records),
        ("hours on grid", grid_hours),
        ("hours missing", missing),
    ];
    for (label, value) in rows {
        let _ = writeln!(out, "{label:<28} {value:>10}");
    }
    for error in &load.row_errors {
        let _ = writeln!(out, "  line {}: {}", error.line, error.message);
    }
    out
}

pub fn observation_count_table(counts: &BTreeMap<usize, usize>) -> String {
    let mut out = heading("Observations per hour");
    let _ = writeln!(out, "{:>12} {:>10}", "per hour", "hours");
    out.push_str(&rule(23));
    for (per_hour, hours) in counts {
        let _ = writeln!(out, "{per_hour:>12} {hours:>10}");
    }
    out
}

pub fn weibull_table(annual: &WeibullFit, seasonal: &SeasonalFits) -> String {
    let mut out = heading("Weibull parameters");
    let _ = writeln!(
        out,
        "{:<8} {:>8} {:>8} {:>8} {:>12} {:>10} {:>6}",
        "fit", "k", "lambda", "mean", "logLik", "AIC", "n"
    );
    out.push_str(&rule(66));
    let mut row = |name: &str, fit: &WeibullFit| {
        let _ = writeln!(
            out,
            "{:<8} {:>8.3} {:>8.3} {:>8.3} {:>12.2} {:>10.2} {:>6}{}",
            name,
            fit.shape,
            fit.scale,
            fit.mean(),
            fit.log_likelihood,
            fit.aic,
            fit.n,
            if fit.saturated { "  (shape saturated)" } else { "" }
        );
    };
    row("Annual", annual);
    for (season, fit) in seasonal {
        row(season.name(), fit);
    }
    if annual.zeros_excluded > 0 {
        let _ = writeln!(out, "{} calm hours excluded from the fit", annual.zeros_excluded);
    }
    out
}

pub fn comparison_table(comparison: &FitComparison) -> String {
    let mut out = heading("Annual vs seasonal Weibull");
    let _ = writeln!(out, "{:<10} {:>12} {:>10} {:>7} {:>6}", "model", "logLik", "AIC", "params", "n");
    out.push_str(&rule(49));
    let _ = writeln!(
        out,
        "{:<10} {:>12.2} {:>10.2} {:>7} {:>6}",
        "annual",
        comparison.annual_log_likelihood,
        comparison.annual_aic,
        comparison.annual_parameters,
        comparison.annual_n
    );
    let _ = writeln!(
        out,
        "{:<10} {:>12.2} {:>10.2} {:>7} {:>6}",
        "seasonal",
        comparison.seasonal_log_likelihood,
        comparison.seasonal_aic,
        comparison.seasonal_parameters,
        comparison.seasonal_n
    );
    let _ = writeln!(
        out,
        "logLik gain {:.2}, AIC difference (seasonal - annual) {:.2}",
        comparison.log_likelihood_gain, comparison.aic_difference
    );
    out
}

pub fn goodness_of_fit_table(gof: &GoodnessOfFit) -> String {
    let mut out = heading("Anderson-Darling (Weibull)");
    let _ = writeln!(out, "sample size        {:>10}", gof.sample_size);
    let _ = writeln!(
        out,
        "sample fit         k = {:.3}, lambda = {:.3}",
        gof.sample_fit.shape, gof.sample_fit.scale
    );
    let _ = writeln!(out, "A^2                {:>10.4}", gof.statistic);
    let _ = writeln!(out, "A*^2               {:>10.4}", gof.adjusted_statistic);
    let _ = writeln!(out, "p-value            {:>10}", gof.p_value_label());
    for alpha in [0.10, 0.05, 0.01] {
        if let (Some(cv), Some(rejects)) = (gof.critical_value(alpha), gof.rejects_at(alpha)) {
            let _ = writeln!(
                out,
                "  {:>4.0}%: critical {:.3} -> {}",
                alpha * 100.0,
                cv,
                if rejects { "reject" } else { "do not reject" }
            );
        }
    }
    out
}

pub fn stationarity_table(adf: &StationarityResult) -> String {
    let mut out = heading("Augmented Dickey-Fuller");
    let _ = writeln!(out, "statistic          {:>10.4}", adf.statistic);
    let _ = writeln!(out, "p-value            {:>10.4}", adf.p_value);
    let _ = writeln!(out, "lags               {:>10}", adf.lags);
    let _ = writeln!(out, "observations       {:>10}", adf.nobs);
    let cv = &adf.critical_values;
    let _ = writeln!(
        out,
        "critical values    1%: {:.3}  5%: {:.3}  10%: {:.3}",
        cv.cv_1pct, cv.cv_5pct, cv.cv_10pct
    );
    let _ = writeln!(
        out,
        "{}",
        if adf.is_stationary {
            "unit root rejected at 5%"
        } else {
            "unit root not rejected at 5%"
        }
    );
    out
}

pub fn search_table(search: &SearchResult) -> String {
    let mut out = heading("Order search");
    let _ = writeln!(
        out,
        "d = {}, D = {}, {} candidates, {} failed",
        search.d,
        search.cap_d,
        search.candidates.len(),
        search.failures()
    );
    for candidate in search.ranked().into_iter().take(5) {
        if let Some(aic) = candidate.aic {
            let _ = writeln!(out, "  {:<28} AIC = {:.2}", candidate.order.to_string(), aic);
        }
    }
    out
}

pub fn model_table(model: &FrozenModel) -> String {
    let sarima = model.model();
    let c = sarima.coefficients();
    let mut out = heading(&format!("Model {}", model.order()));
    let mut coefficient_rows = |prefix: &str, values: &[f64], lag: usize| {
        for (i, v) in values.iter().enumerate() {
            let _ = writeln!(out, "{:<14} {:>10.4}", format!("{prefix}{}", (i + 1) * lag), v);
        }
    };
    let s = model.order().s.max(1);
    coefficient_rows("ar.L", &c.ar, 1);
    coefficient_rows("ma.L", &c.ma, 1);
    coefficient_rows("ar.S.L", &c.seasonal_ar, s);
    coefficient_rows("ma.S.L", &c.seasonal_ma, s);
    if model.order().includes_mean() {
        let _ = writeln!(out, "{:<14} {:>10.4}", "mean", c.mean);
    }
    if let Some(regression) = model.regression() {
        let _ = writeln!(out, "{:<14} {:>10.4}", format!("{}", regression.reference), regression.intercept);
        for (season, effect) in &regression.effects {
            let _ = writeln!(out, "{:<14} {:>+10.4}", season.name(), effect);
        }
    }
    let _ = writeln!(out, "{:<14} {:>10.4}", "sigma2", sarima.sigma2());
    let _ = writeln!(out, "{:<14} {:>10.2}", "logLik", sarima.log_likelihood());
    let _ = writeln!(out, "{:<14} {:>10.2}", "AIC", sarima.aic());
    let _ = writeln!(out, "{:<14} {:>10.2}", "BIC", sarima.bic());
    out
}

pub fn diagnostics_table(diagnostics: &ResidualDiagnostics) -> String {
    let mut out = heading("Residual diagnostics");
    let _ = writeln!(out, "residuals          {:>10}", diagnostics.n);
    let _ = writeln!(out, "mean               {:>10.4}", diagnostics.residual_mean);
    let _ = writeln!(out, "variance           {:>10.4}", diagnostics.residual_variance);
    for lb in &diagnostics.ljung_box {
        let _ = writeln!(
            out,
            "Ljung-Box lag {:>3}  Q = {:>9.2}  df = {:>3}  p = {:.4}",
            lb.lags, lb.statistic, lb.df, lb.p_value
        );
    }
    let band = diagnostics.correlogram.band;
    let significant = diagnostics.correlogram.significant_acf_lags();
    let _ = writeln!(out, "ACF lags outside ±{band:.3}: {significant:?}");
    out
}

/// Forecast with intervals, floored at zero for display.
pub fn forecast_table(forecast: &Forecast) -> String {
    let display = forecast.clipped_at_zero();
    let mut out = heading(&format!("{}-hour forecast", display.horizon()));
    let mut header = format!("{:<20} {:>8}", "hour", "speed");
    for interval in display.intervals() {
        let pct = (interval.level * 100.0).round();
        let _ = write!(header, " {:>9} {:>9}", format!("lo{pct}"), format!("hi{pct}"));
    }
    let _ = writeln!(out, "{header}");
    out.push_str(&rule(header.len()));
    for h in 0..display.horizon() {
        let hour = display
            .timestamps()
            .get(h)
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| format!("h+{}", h + 1));
        let _ = write!(out, "{:<20} {:>8.2}", hour, display.point()[h]);
        for interval in display.intervals() {
            let _ = write!(out, " {:>9.2} {:>9.2}", interval.lower[h], interval.upper[h]);
        }
        out.push('\n');
    }
    out
}

/// Every table of a run, in pipeline order.
pub fn render(report: &AnalysisReport) -> String {
    let mut out = String::new();
    out.push_str(&load_table(
        &report.load,
        report.hourly_records,
        report.series.len(),
        report.series.missing_count(),
    ));
    out.push_str(&observation_count_table(&report.observation_counts));
    out.push_str(&weibull_table(&report.annual, &report.seasonal));
    out.push_str(&comparison_table(&report.comparison));
    out.push_str(&goodness_of_fit_table(&report.goodness_of_fit));
    out.push_str(&stationarity_table(&report.stationarity));
    if let Some(search) = &report.search {
        out.push_str(&search_table(search));
    }
    out.push_str(&model_table(&report.model));
    out.push_str(&diagnostics_table(&report.diagnostics));
    out.push_str(&forecast_table(&report.forecast));
    out
}
