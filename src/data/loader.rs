//! CSV loading and cleaning of raw wind observations.

use crate::core::{AnalysisWindow, Observation};
use crate::error::{Result, WindError};
use chrono::{NaiveDate, NaiveDateTime};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

/// Number of row errors kept verbatim in the load report.
const MAX_REPORTED_ROW_ERRORS: usize = 20;

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Options controlling how the input file is interpreted.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Header of the timestamp column.
    pub timestamp_column: String,
    /// Header of the wind-speed column.
    pub wind_speed_column: String,
    /// Rows outside this window are discarded.
    pub window: AnalysisWindow,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            timestamp_column: "timestamp".to_string(),
            wind_speed_column: "wind_speed".to_string(),
            window: AnalysisWindow::default(),
        }
    }
}

/// A row that could not be used.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    /// 1-based line number in the file (the header is line 1).
    pub line: usize,
    pub message: String,
}

/// Counts describing what happened during loading.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub rows_read: usize,
    /// Rows dropped because a field could not be parsed.
    pub dropped_rows: usize,
    /// Parsed rows discarded for falling outside the window.
    pub outside_window: usize,
    /// Rows kept with an empty wind-speed field.
    pub missing_speeds: usize,
    /// The first few row errors.
    pub row_errors: Vec<RowError>,
}

impl LoadReport {
    fn reject(&mut self, line: usize, message: String) {
        self.dropped_rows += 1;
        if self.row_errors.len() < MAX_REPORTED_ROW_ERRORS {
            self.row_errors.push(RowError { line, message });
        }
    }
}

/// Cleaned observations plus the load report.
#[derive(Debug, Clone)]
pub struct LoadedData {
    /// Observations sorted ascending by timestamp, restricted to the window.
    pub observations: Vec<Observation>,
    pub report: LoadReport,
}

/// Load and clean observations from a CSV file.
pub fn load_observations(path: &Path, options: &LoadOptions) -> Result<LoadedData> {
    info!(path = %path.display(), "loading wind observations");
    let file = File::open(path)?;
    read_observations(file, options)
}

/// Load and clean observations from any CSV source.
pub fn read_observations<R: Read>(source: R, options: &LoadOptions) -> Result<LoadedData> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(source);

    let headers = reader.headers()?.clone();
    let ts_idx = find_column(&headers, &options.timestamp_column)?;
    let speed_idx = find_column(&headers, &options.wind_speed_column)?;

    let mut report = LoadReport::default();
    let mut observations = Vec::new();

    for (idx, result) in reader.records().enumerate() {
        let line = idx + 2;
        report.rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                report.reject(line, format!("CSV parse error: {e}"));
                continue;
            }
        };

        let raw_ts = record.get(ts_idx).unwrap_or("");
        let timestamp = match parse_timestamp(raw_ts) {
            Some(ts) => ts,
            None => {
                report.reject(line, format!("unparseable timestamp '{raw_ts}'"));
                continue;
            }
        };

        let raw_speed = record.get(speed_idx).unwrap_or("");
        let wind_speed = if raw_speed.is_empty() {
            report.missing_speeds += 1;
            f64::NAN
        } else {
            match raw_speed.parse::<f64>() {
                Ok(v) if v.is_finite() && v >= 0.0 => v,
                Ok(v) => {
                    report.reject(line, format!("wind speed {v} is not a finite non-negative number"));
                    continue;
                }
                Err(_) => {
                    report.reject(line, format!("non-numeric wind speed '{raw_speed}'"));
                    continue;
                }
            }
        };

        if !options.window.contains(&timestamp) {
            report.outside_window += 1;
            continue;
        }

        observations.push(Observation::new(timestamp, wind_speed));
    }

    observations.sort_by_key(|o| o.timestamp);

    for error in &report.row_errors {
        debug!(line = error.line, "dropped row: {}", error.message);
    }
    if report.dropped_rows > 0 {
        warn!(
            dropped = report.dropped_rows,
            rows = report.rows_read,
            "dropped rows that failed to parse"
        );
    }
    info!(
        kept = observations.len(),
        outside_window = report.outside_window,
        missing_speeds = report.missing_speeds,
        "cleaned observations"
    );

    if observations.is_empty() {
        return Err(WindError::InputRange(format!(
            "no observations fall inside [{}, {})",
            options.window.start, options.window.end
        )));
    }

    Ok(LoadedData {
        observations,
        report,
    })
}

/// Locate a column by header name, ignoring case and surrounding whitespace.
fn find_column(headers: &csv::StringRecord, name: &str) -> Result<usize> {
    let wanted = name.trim().to_ascii_lowercase();
    headers
        .iter()
        .position(|h| h.trim().trim_start_matches('\u{feff}').to_ascii_lowercase() == wanted)
        .ok_or_else(|| WindError::MissingColumn(name.to_string()))
}

/// Parse an ISO-8601-like timestamp.
///
/// A trailing fixed UTC offset (`+00:00`, `-0300`, `Z`, ...) is stripped, not
/// applied: the wall-clock reading is kept as is. Date-only values map to
/// midnight.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = strip_utc_offset(raw.trim());
    if trimmed.is_empty() {
        return None;
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Remove a trailing UTC-offset designator, if any.
fn strip_utc_offset(s: &str) -> &str {
    if let Some(rest) = s.strip_suffix('Z').or_else(|| s.strip_suffix('z')) {
        return rest;
    }

    // Offsets only follow a time of day.
    if !s.contains(':') {
        return s;
    }

    let bytes = s.as_bytes();
    let is_sign = |b: u8| b == b'+' || b == b'-';
    let digits = |range: &[u8]| range.iter().all(u8::is_ascii_digit);
    let n = bytes.len();

    // +HH:MM
    if n > 6
        && is_sign(bytes[n - 6])
        && digits(&bytes[n - 5..n - 3])
        && bytes[n - 3] == b':'
        && digits(&bytes[n - 2..])
        && bytes[n - 7].is_ascii_digit()
    {
        return &s[..n - 6];
    }
    // +HHMM
    if n > 5 && is_sign(bytes[n - 5]) && digits(&bytes[n - 4..]) && bytes[n - 6].is_ascii_digit() {
        return &s[..n - 5];
    }
    // +HH
    if n > 3 && is_sign(bytes[n - 3]) && digits(&bytes[n - 2..]) && bytes[n - 4].is_ascii_digit() {
        return &s[..n - 3];
    }

    s
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap()
    }

    #[test]
    fn offset_suffix_is_stripped_not_converted() {
        let with_offset = parse_timestamp("2023-06-01T10:15:00+00:00").unwrap();
        let without = parse_timestamp("2023-06-01T10:15:00").unwrap();
        assert_eq!(with_offset, without);
        assert_eq!(with_offset, ts(2023, 6, 1, 10, 15, 0));

        // a non-zero offset keeps the wall-clock reading
        assert_eq!(
            parse_timestamp("2023-06-01T10:15:00-03:00").unwrap(),
            ts(2023, 6, 1, 10, 15, 0)
        );
        assert_eq!(
            parse_timestamp("2023-06-01T10:15:00+0000").unwrap(),
            ts(2023, 6, 1, 10, 15, 0)
        );
        assert_eq!(
            parse_timestamp("2023-06-01T10:15:00Z").unwrap(),
            ts(2023, 6, 1, 10, 15, 0)
        );
    }

    #[test]
    fn accepts_common_layouts() {
        assert_eq!(
            parse_timestamp("2023-06-01 10:15:30").unwrap(),
            ts(2023, 6, 1, 10, 15, 30)
        );
        assert_eq!(
            parse_timestamp("2023-06-01T10:15:30.250+00:00").unwrap(),
            ts(2023, 6, 1, 10, 15, 30) + chrono::Duration::milliseconds(250)
        );
        assert_eq!(
            parse_timestamp("2023-06-01 10:15").unwrap(),
            ts(2023, 6, 1, 10, 15, 0)
        );
        assert_eq!(parse_timestamp("2023-06-01").unwrap(), ts(2023, 6, 1, 0, 0, 0));
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("2023-13-01T00:00:00").is_none());
    }

    const CSV: &str = "\
location,latitude,longitude,timestamp,wind_speed
Site A,-33.9,151.2,2023-06-01T10:15:00+00:00,3.0
Site A,-33.9,151.2,2023-06-01T10:05:00+00:00,5.0
Site A,-33.9,151.2,not-a-time,4.0
Site A,-33.9,151.2,2023-06-01T11:00:00+00:00,fast
Site A,-33.9,151.2,2023-06-01T12:00:00+00:00,
Site A,-33.9,151.2,2022-01-01T00:00:00+00:00,4.0
Site A,-33.9,151.2,2024-04-01T00:00:00+00:00,4.0
";

    #[test]
    fn loads_sorts_filters_and_counts() {
        let loaded = read_observations(CSV.as_bytes(), &LoadOptions::default()).unwrap();
        let obs = &loaded.observations;

        assert_eq!(obs.len(), 3);
        assert_eq!(obs[0].timestamp, ts(2023, 6, 1, 10, 5, 0));
        assert_eq!(obs[0].wind_speed, 5.0);
        assert_eq!(obs[1].wind_speed, 3.0);
        assert!(obs[2].wind_speed.is_nan());

        let report = &loaded.report;
        assert_eq!(report.rows_read, 7);
        assert_eq!(report.dropped_rows, 2);
        assert_eq!(report.outside_window, 2);
        assert_eq!(report.missing_speeds, 1);
        assert_eq!(report.row_errors[0].line, 4);
    }

    #[test]
    fn missing_required_column_is_fatal() {
        let csv = "timestamp,speed\n2023-06-01T10:00:00,3.0\n";
        let err = read_observations(csv.as_bytes(), &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, WindError::MissingColumn(ref c) if c == "wind_speed"));
    }

    #[test]
    fn column_lookup_ignores_case() {
        let csv = "Timestamp, Wind_Speed \n2023-06-01T10:00:00,3.0\n";
        let loaded = read_observations(csv.as_bytes(), &LoadOptions::default()).unwrap();
        assert_eq!(loaded.observations.len(), 1);
    }

    #[test]
    fn nothing_in_window_is_an_input_range_error() {
        let csv = "timestamp,wind_speed\n2020-06-01T10:00:00,3.0\n";
        let err = read_observations(csv.as_bytes(), &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, WindError::InputRange(_)));
    }
}
