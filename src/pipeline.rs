//! The end-to-end analysis: load, characterise, model, forecast.

use crate::config::AnalysisConfig;
use crate::core::{Forecast, HourlySeries};
use crate::data::{
    aggregate_hourly, load_observations, observation_count_distribution, read_observations,
    LoadReport, LoadedData,
};
use crate::distribution::{
    compare_fits, fit_seasonal, fit_weibull, simulate_seasonal, weibull_goodness_of_fit,
    FitComparison, GoodnessOfFit, SeasonalFits, WeibullFit,
};
use crate::error::Result;
use crate::features::Correlogram;
use crate::models::arima::{
    diagnose, search_orders, FrozenModel, ModelOrder, ResidualDiagnostics, SearchConfig,
    SearchMode, SearchResult, SeasonRegression,
};
use crate::validation::{adf_test, StationarityResult};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::BTreeMap;
use std::io::Read;
use tracing::{info, warn};

/// Everything one run produces.
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub load: LoadReport,
    /// Hours with at least one observation.
    pub hourly_records: usize,
    /// Observations per hour -> number of hours.
    pub observation_counts: BTreeMap<usize, usize>,
    pub series: HourlySeries,
    pub annual: WeibullFit,
    pub seasonal: SeasonalFits,
    pub comparison: FitComparison,
    pub goodness_of_fit: GoodnessOfFit,
    /// One simulated speed per present hour.
    pub simulated: Vec<f64>,
    pub stationarity: StationarityResult,
    /// ACF/PACF of the gap-filled series.
    pub correlogram: Correlogram,
    pub search: Option<SearchResult>,
    pub model: FrozenModel,
    pub diagnostics: ResidualDiagnostics,
    pub forecast: Forecast,
    pub recent_forecast: Forecast,
    /// History the recent-window forecast was filtered over.
    pub recent_history: HourlySeries,
}

/// Run the analysis on the configured input file.
pub fn run(config: &AnalysisConfig) -> Result<AnalysisReport> {
    let loaded = load_observations(&config.input, &config.load_options())?;
    analyze(loaded, config)
}

/// Run the analysis on CSV text from any reader.
pub fn run_from_reader<R: Read>(source: R, config: &AnalysisConfig) -> Result<AnalysisReport> {
    let loaded = read_observations(source, &config.load_options())?;
    analyze(loaded, config)
}

/// Run every stage after loading.
pub fn analyze(loaded: LoadedData, config: &AnalysisConfig) -> Result<AnalysisReport> {
    let LoadedData {
        observations,
        report: load,
    } = loaded;

    let records = aggregate_hourly(&observations);
    let observation_counts = observation_count_distribution(&records);
    let series = HourlySeries::spanning(&records)?;
    info!(
        records = records.len(),
        grid_hours = series.len(),
        missing = series.missing_count(),
        "aggregated to hourly series"
    );

    // Weibull characterisation
    let policy = config.weibull.zero_policy;
    let annual = fit_weibull(&series.present_values(), policy, "annual")?;
    let seasonal = fit_seasonal(&series, policy)?;
    let comparison = compare_fits(&annual, &seasonal);
    info!(
        shape = annual.shape,
        scale = annual.scale,
        aic_difference = comparison.aic_difference,
        "weibull fits complete"
    );

    let mut rng = StdRng::seed_from_u64(config.weibull.seed);
    let goodness_of_fit = weibull_goodness_of_fit(
        &series.present_values(),
        &annual,
        config.weibull.goodness_of_fit_points,
        &mut rng,
    )?;
    let simulated = simulate_seasonal(&series, &seasonal, config.weibull.seed)?;

    // SARIMA identification
    let filled = series.interpolated();
    let stationarity = adf_test(filled.values(), None)?;
    if !stationarity.is_stationary {
        warn!(
            statistic = stationarity.statistic,
            p_value = stationarity.p_value,
            "ADF does not reject a unit root"
        );
    }
    let correlogram = Correlogram::new(filled.values(), config.sarima.max_lag);

    let (order, search) = select_order(&filled, config)?;
    let model = FrozenModel::freeze(&series, order, config.sarima.season_regressors)?;
    let diagnostics = diagnose(model.model(), config.sarima.max_lag);

    // Forecasts
    let levels = &config.sarima.levels;
    let forecast = model.forecast(config.sarima.horizon, levels)?;
    let recent_history = series.tail(config.sarima.recent_history.min(series.len()))?;
    let recent_forecast =
        model.forecast_from_history(&recent_history, config.sarima.horizon, levels)?;
    info!(
        order = %model.order(),
        horizon = forecast.horizon(),
        "forecasts complete"
    );

    Ok(AnalysisReport {
        load,
        hourly_records: records.len(),
        observation_counts,
        series,
        annual,
        seasonal,
        comparison,
        goodness_of_fit,
        simulated,
        stationarity,
        correlogram,
        search,
        model,
        diagnostics,
        forecast,
        recent_forecast,
        recent_history,
    })
}

/// The configured order, or the search winner when a search mode is set.
fn select_order(filled: &HourlySeries, config: &AnalysisConfig) -> Result<(ModelOrder, Option<SearchResult>)> {
    if config.search.mode == SearchMode::None {
        return Ok((config.sarima.model_order(), None));
    }

    let values = if config.sarima.season_regressors {
        SeasonRegression::fit(filled.values(), filled.seasons())?
            .remove(filled.values(), filled.seasons())
    } else {
        filled.values().to_vec()
    };
    let search = SearchConfig {
        period: config.sarima.period,
        ..config.search.clone()
    };
    if search.period != config.search.period {
        warn!(
            search_period = config.search.period,
            sarima_period = config.sarima.period,
            "order search uses the SARIMA period"
        );
    }
    let result = search_orders(&values, &search)?;
    Ok((result.best.order(), Some(result)))
}
