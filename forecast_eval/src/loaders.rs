//! Benchmark sources backed by local files

use crate::data::{Metadata, ScenarioSample, TimeSeriesDataset, TimeSeriesPoint};
use crate::error::{EvalError, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Data a benchmark is evaluated on
#[derive(Debug, Clone, PartialEq)]
pub enum Benchmark {
    /// A single long series, evaluated by walk-forward backtesting
    TimeSeries(TimeSeriesDataset),
    /// Independent samples, evaluated with RCRPS
    Scenario(Vec<ScenarioSample>),
}

impl Benchmark {
    pub fn kind(&self) -> &'static str {
        match self {
            Benchmark::TimeSeries(_) => "time_series",
            Benchmark::Scenario(_) => "scenario",
        }
    }
}

fn default_timestamp_column() -> String {
    "timestamp".to_string()
}

fn default_value_column() -> String {
    "value".to_string()
}

/// Loads a time series from a CSV file with a header row.
///
/// Columns other than the timestamp and value columns become feature
/// channels.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CsvSeriesLoader {
    pub path: PathBuf,
    #[serde(default = "default_timestamp_column")]
    pub timestamp_column: String,
    #[serde(default = "default_value_column")]
    pub value_column: String,
    #[serde(default)]
    pub frequency: Option<String>,
}

impl CsvSeriesLoader {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            timestamp_column: default_timestamp_column(),
            value_column: default_value_column(),
            frequency: None,
        }
    }

    pub fn load(&self) -> Result<TimeSeriesDataset> {
        let mut reader = csv::Reader::from_path(&self.path)?;
        let headers = reader.headers()?.clone();

        let time_idx = column_index(&headers, &self.timestamp_column)?;
        let value_idx = column_index(&headers, &self.value_column)?;

        let mut points = Vec::new();
        for record in reader.records() {
            let record = record?;
            let raw_time = record.get(time_idx).unwrap_or_default();
            let timestamp = parse_timestamp(raw_time)?;
            let value = record
                .get(value_idx)
                .and_then(|v| v.trim().parse::<f64>().ok())
                .unwrap_or(f64::NAN);

            let mut features = BTreeMap::new();
            for (idx, name) in headers.iter().enumerate() {
                if idx == time_idx || idx == value_idx {
                    continue;
                }
                if let Some(v) = record.get(idx).and_then(|v| v.trim().parse::<f64>().ok()) {
                    features.insert(name.to_string(), v);
                }
            }

            let point = TimeSeriesPoint::new(timestamp, value);
            points.push(if features.is_empty() {
                point
            } else {
                point.with_features(features)
            });
        }
        debug!(path = %self.path.display(), points = points.len(), "loaded CSV series");

        let metadata = Metadata::from([(
            "source".to_string(),
            serde_json::Value::String(self.path.display().to_string()),
        )]);
        let dataset = TimeSeriesDataset::new(points).with_metadata(metadata);
        Ok(match &self.frequency {
            Some(frequency) => dataset.with_frequency(frequency.clone()),
            None => dataset,
        })
    }
}

fn column_index(headers: &csv::StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h.trim() == name)
        .ok_or_else(|| EvalError::Data(format!("Column '{}' not found", name)))
}

/// Parse an RFC 3339 timestamp or a plain `YYYY-MM-DD` date (midnight UTC)
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| EvalError::Data(format!("Unrecognized timestamp '{}'", raw)))
}

/// Loads scenario samples from a JSON-lines file, one sample per line
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct JsonlScenarioLoader {
    pub path: PathBuf,
    #[serde(default)]
    pub max_samples: Option<usize>,
}

impl JsonlScenarioLoader {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            max_samples: None,
        }
    }

    pub fn load(&self) -> Result<Vec<ScenarioSample>> {
        let reader = BufReader::new(File::open(&self.path)?);
        let limit = self.max_samples.unwrap_or(usize::MAX);

        let mut samples = Vec::new();
        for (idx, line) in reader.lines().enumerate() {
            if samples.len() >= limit {
                break;
            }
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let mut sample: ScenarioSample = serde_json::from_str(&line).map_err(|e| {
                EvalError::Data(format!("{} line {}: {}", self.path.display(), idx + 1, e))
            })?;
            if sample.sample_id.is_empty() {
                sample.sample_id = format!("sample-{}", idx);
            }
            samples.push(sample);
        }
        debug!(path = %self.path.display(), samples = samples.len(), "loaded scenario samples");
        Ok(samples)
    }
}

/// Built-in single-sample scenario set, useful as a smoke benchmark
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntheticScenarioLoader;

impl SyntheticScenarioLoader {
    pub fn load(&self) -> Vec<ScenarioSample> {
        vec![ScenarioSample::new("synthetic-0", vec![1.0, 2.0, 3.0], vec![3.5, 3.7])
            .with_context("Synthetic fallback sample.")
            .with_roi(0.0, 10.0)]
    }
}
